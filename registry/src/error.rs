use attest_stake::StakeError;
use attest_types::{ActorId, ErrorCategory, StakeId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("{0} is not authorized for this registry operation")]
    Unauthorized(ActorId),

    #[error("{actor} is already registered in {stake_id}")]
    AlreadyRegistered { stake_id: StakeId, actor: ActorId },

    #[error("{actor} is not registered in {stake_id}")]
    NotRegistered { stake_id: StakeId, actor: ActorId },

    #[error("{actor} has slots in use: {free_slots} of {max_slots} free")]
    SlotsInUse {
        actor: ActorId,
        free_slots: u32,
        max_slots: u32,
    },

    #[error("at least one slot is required")]
    ZeroSlots,

    #[error("stake for {slots} slots of {amount_per_slot} overflows")]
    StakeOverflow { slots: u32, amount_per_slot: u128 },

    #[error("{0} appears more than once")]
    DuplicateActor(ActorId),

    #[error("{0} has no free slots")]
    NoFreeSlots(ActorId),

    #[error("{0} has no reserved slot to return")]
    SlotOverflow(ActorId),

    #[error("not enough registrants with free slots: need {needed}, have {available}")]
    InsufficientRegistrants { needed: usize, available: usize },

    #[error(transparent)]
    Stake(#[from] StakeError),
}

impl RegistryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unauthorized(_)
            | Self::AlreadyRegistered { .. }
            | Self::NotRegistered { .. }
            | Self::SlotsInUse { .. } => ErrorCategory::Authorization,
            Self::ZeroSlots | Self::StakeOverflow { .. } | Self::DuplicateActor(_) => {
                ErrorCategory::InvalidArgument
            }
            Self::NoFreeSlots(_) | Self::InsufficientRegistrants { .. } => ErrorCategory::Capacity,
            Self::SlotOverflow(_) => ErrorCategory::Integrity,
            Self::Stake(e) => e.category(),
        }
    }
}
