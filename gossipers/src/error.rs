use attest_registry::RegistryError;
use attest_types::{ActorId, ChannelId, ErrorCategory};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GossiperError {
    #[error("{0} is not authorized for this channel operation")]
    Unauthorized(ActorId),

    #[error("channel {0} already exists")]
    AlreadyExists(ChannelId),

    #[error("channel {0} not found")]
    ChannelNotFound(ChannelId),

    #[error("invalid threshold: m={threshold_m} of k={required_k} (minimum k is {min_k})")]
    InvalidThreshold {
        required_k: usize,
        threshold_m: usize,
        min_k: usize,
    },

    #[error("not enough available gossipers: need {needed}, have {available}")]
    InsufficientGossipers { needed: usize, available: usize },

    #[error("stake per slot {amount_per_slot} below minimum {minimum}")]
    StakeTooLow { amount_per_slot: u128, minimum: u128 },

    #[error("{slots} slots below minimum {minimum}")]
    TooFewSlots { slots: u32, minimum: u32 },

    #[error("{slots} slots above maximum {maximum}")]
    TooManySlots { slots: u32, maximum: u32 },

    #[error("merkle root must have at least one leaf")]
    EmptyMerkleRoot,

    #[error("{0} already submitted a proof")]
    AlreadySubmitted(ActorId),

    #[error("signature from {0} does not verify")]
    InvalidSignature(ActorId),

    #[error("channel {0} is terminated")]
    ChannelTerminated(ChannelId),

    #[error("channel {0} has not been validated")]
    NotValidated(ChannelId),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl GossiperError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) => ErrorCategory::Authorization,
            Self::AlreadyExists(_) | Self::AlreadySubmitted(_) | Self::InvalidSignature(_) => {
                ErrorCategory::Integrity
            }
            Self::ChannelTerminated(_) | Self::NotValidated(_) => ErrorCategory::Timing,
            Self::InsufficientGossipers { .. } | Self::StakeTooLow { .. } => {
                ErrorCategory::Capacity
            }
            Self::ChannelNotFound(_)
            | Self::InvalidThreshold { .. }
            | Self::TooFewSlots { .. }
            | Self::TooManySlots { .. }
            | Self::EmptyMerkleRoot => ErrorCategory::InvalidArgument,
            Self::Registry(e) => e.category(),
        }
    }
}
