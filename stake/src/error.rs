use attest_types::{ActorId, ErrorCategory, StakeId};
use thiserror::Error;

use crate::ledger::LedgerError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StakeError {
    #[error("{0} is not authorized to move stake")]
    Unauthorized(ActorId),

    #[error("insufficient balance or allowance: need {needed}, available {available}")]
    InsufficientBalance { needed: u128, available: u128 },

    #[error("insufficient stake for {actor} in {stake_id}: need {needed}, staked {available}")]
    InsufficientStake {
        stake_id: StakeId,
        actor: ActorId,
        needed: u128,
        available: u128,
    },

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("ledger rejected transfer: {0}")]
    Ledger(#[from] LedgerError),
}

impl StakeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_) => ErrorCategory::Authorization,
            Self::InsufficientBalance { .. }
            | Self::InsufficientStake { .. }
            | Self::Ledger(_) => ErrorCategory::Capacity,
            Self::ZeroAmount => ErrorCategory::InvalidArgument,
        }
    }
}
