//! Verifier pool: proof-of-correctness quorum.
//!
//! A requester opens a challenge against a trained model and the pool
//! reserves `k` staked verifiers. Any reserved verifier starts the
//! commit-reveal vote; verifiers then commit and reveal through the shared
//! [`CommitRevealEngine`](attest_commit_reveal::CommitRevealEngine). The
//! first call to `get_commit_reveal_results` after the vote closes releases
//! every reservation, records the verdict and slashes the losers.

pub mod challenge;
pub mod config;
pub mod error;
pub mod pool;

pub use challenge::{Challenge, ChallengeOutcome, ChallengeState, Verdict};
pub use config::VerifierPoolConfig;
pub use error::VerifierError;
pub use pool::VerifierPool;
