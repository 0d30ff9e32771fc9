//! In-memory storage primitives for the attest protocol.
//!
//! - [`KeyedStore`] is the arena every component keeps its records in: one
//!   entry per identifier, each behind its own mutex, so calls on the same
//!   identifier are serialized while calls on different identifiers run in
//!   parallel.
//! - [`EventLog`] is the append-only audit trail. Components write to it and
//!   never read it back for control decisions.

pub mod event_log;
pub mod keyed;

pub use event_log::{EventLog, MemoryEventLog, NullEventLog};
pub use keyed::{InsertError, KeyedStore};
