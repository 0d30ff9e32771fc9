//! Shared utilities for the attest protocol.

pub mod time;

pub use time::format_duration;
