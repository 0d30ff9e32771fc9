//! Gossiper pool: proof-of-training quorum.
//!
//! A requester opens a channel and the pool reserves `k` staked gossipers.
//! Each gossiper signs the training run's outcome (merkle root of the
//! training transcript, end-of-training marker, result digest) and submits
//! it. Once `m` proofs agree on `(merkle_root, result_digest)` the channel
//! is validated. Terminating the channel returns every reserved slot and
//! slashes gossipers that stayed silent or disagreed.

pub mod channel;
pub mod config;
pub mod error;
pub mod pool;
pub mod proof;
pub mod verifier;

pub use channel::{Channel, ProofKey, SignedProof};
pub use config::GossiperPoolConfig;
pub use error::GossiperError;
pub use pool::GossiperPool;
pub use proof::proof_message;
pub use verifier::{Ed25519ProofVerifier, ProofVerifier};
