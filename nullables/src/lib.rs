//! Nullable infrastructure for deterministic testing.
//!
//! The engine's external collaborators (wall clock, token ledger, signature
//! checks) are abstracted behind traits. This crate provides test-friendly
//! implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests and simulations.

pub mod clock;
pub mod ledger;
pub mod verifier;

pub use clock::NullClock;
pub use ledger::MemoryLedger;
pub use verifier::NullProofVerifier;
