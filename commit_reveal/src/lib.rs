//! Commit-reveal voting.
//!
//! A commitment is one timed vote among a fixed voter set:
//!
//! 1. **Commit** (`now < commit_deadline`): each voter submits
//!    `Blake2b(vote || value)` exactly once.
//! 2. **Reveal** (`commit_deadline <= now < reveal_deadline`): each voter
//!    discloses `(vote, value)`; the engine recomputes the hash and rejects
//!    anything that does not match the stored commit.
//! 3. **Resolve** (reveal window over, or everyone revealed): the vote passes
//!    iff strictly more than half of the *full* voter set revealed `true`.
//!    Abstainers always lose, so withholding a losing reveal gains nothing.
//!
//! The engine depends on no other component; pools drive it with explicit
//! timestamps and poll `can_reveal` / `is_commitment_timedout`.

pub mod commitment;
pub mod engine;
pub mod error;

pub use commitment::{commit_hash, tally, Commitment, CommitmentResult, Outcome, Phase, Reveal};
pub use engine::CommitRevealEngine;
pub use error::CommitRevealError;
