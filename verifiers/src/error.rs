use attest_commit_reveal::CommitRevealError;
use attest_registry::RegistryError;
use attest_types::{ActorId, ChallengeId, ErrorCategory, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifierError {
    #[error("{0} is not authorized for this challenge operation")]
    Unauthorized(ActorId),

    #[error("challenge {0} already exists")]
    DuplicateIdentifier(ChallengeId),

    #[error("challenge {0} not found")]
    ChallengeNotFound(ChallengeId),

    #[error("k={k} is below the minimum quorum of {min_k}")]
    BelowMinimumQuorum { k: usize, min_k: usize },

    #[error("not enough available verifiers: need {needed}, have {available}")]
    InsufficientVerifiers { needed: usize, available: usize },

    #[error("stake per slot {amount_per_slot} below minimum {minimum}")]
    StakeTooLow { amount_per_slot: u128, minimum: u128 },

    #[error("{slots} slots outside 1..={maximum}")]
    InvalidSlots { slots: u32, maximum: u32 },

    #[error("wall time must be non-zero")]
    InvalidWallTime,

    #[error("challenge wall time ended at {deadline}")]
    ChallengeExpired { deadline: Timestamp },

    #[error("challenge wall time runs until {deadline}")]
    ChallengeNotExpired { deadline: Timestamp },

    #[error("commit-reveal phase of challenge {0} has not started")]
    ChallengeNotStarted(ChallengeId),

    #[error("challenge {0} is already resolved")]
    AlreadyResolved(ChallengeId),

    #[error(transparent)]
    CommitReveal(#[from] CommitRevealError),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl VerifierError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) => ErrorCategory::Authorization,
            Self::DuplicateIdentifier(_) | Self::AlreadyResolved(_) => ErrorCategory::Integrity,
            Self::InsufficientVerifiers { .. } | Self::StakeTooLow { .. } => {
                ErrorCategory::Capacity
            }
            Self::ChallengeExpired { .. }
            | Self::ChallengeNotExpired { .. }
            | Self::ChallengeNotStarted(_) => ErrorCategory::Timing,
            Self::ChallengeNotFound(_)
            | Self::BelowMinimumQuorum { .. }
            | Self::InvalidSlots { .. }
            | Self::InvalidWallTime => ErrorCategory::InvalidArgument,
            Self::CommitReveal(e) => e.category(),
            Self::Registry(e) => e.category(),
        }
    }
}
