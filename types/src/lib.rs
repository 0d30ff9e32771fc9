//! Fundamental types for the attest protocol.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! actor identities, 32-byte identifiers, timestamps and clocks, signing keys,
//! error categories, and the audit events written by every state change.

pub mod actor;
pub mod error;
pub mod event;
pub mod ids;
pub mod keys;
pub mod time;

pub use actor::ActorId;
pub use error::ErrorCategory;
pub use event::{AuditEvent, StakeEventKind};
pub use ids::{ChallengeId, ChannelId, CommitmentId, DataRef, Digest, ModelId, ProofId, StakeId};
pub use keys::{KeyPair, PrivateKey, PublicKey, Signature};
pub use time::{Clock, SystemClock, Timestamp};
