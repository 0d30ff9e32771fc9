use attest_types::{ActorId, CommitmentId, ErrorCategory, Timestamp};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommitRevealError {
    #[error("commitment {0} already exists")]
    DuplicateIdentifier(CommitmentId),

    #[error("voter set must be non-empty and free of duplicates")]
    InvalidVoterSet,

    #[error("commit and reveal windows must both be non-zero")]
    InvalidWindow,

    #[error("commitment {0} not found")]
    NotFound(CommitmentId),

    #[error("{0} is not a voter in this commitment")]
    NotAVoter(ActorId),

    #[error("commit window closed at {deadline}")]
    CommitWindowClosed { deadline: Timestamp },

    #[error("{0} has already committed")]
    AlreadyCommitted(ActorId),

    #[error("reveal window opens at {opens}")]
    RevealWindowNotOpen { opens: Timestamp },

    #[error("reveal window closed at {deadline}")]
    RevealWindowClosed { deadline: Timestamp },

    #[error("{0} never committed")]
    NotCommitted(ActorId),

    #[error("{0} has already revealed")]
    AlreadyRevealed(ActorId),

    #[error("revealed value does not match the commit of {0}")]
    InvalidPreimage(ActorId),

    #[error("result not ready: {revealed} of {voters} revealed before {deadline}")]
    ChallengeNotReady {
        revealed: usize,
        voters: usize,
        deadline: Timestamp,
    },
}

impl CommitRevealError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotAVoter(_) => ErrorCategory::Authorization,
            Self::CommitWindowClosed { .. }
            | Self::RevealWindowNotOpen { .. }
            | Self::RevealWindowClosed { .. }
            | Self::ChallengeNotReady { .. } => ErrorCategory::Timing,
            Self::DuplicateIdentifier(_)
            | Self::AlreadyCommitted(_)
            | Self::NotCommitted(_)
            | Self::AlreadyRevealed(_)
            | Self::InvalidPreimage(_) => ErrorCategory::Integrity,
            Self::InvalidVoterSet | Self::InvalidWindow | Self::NotFound(_) => {
                ErrorCategory::InvalidArgument
            }
        }
    }
}
