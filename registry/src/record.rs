use attest_types::Timestamp;
use serde::{Deserialize, Serialize};

/// Capacity bookkeeping for one actor in one pool.
///
/// `free_slots <= max_slots` always holds, and so does
/// `pending_slot_reduction <= max_slots - free_slots`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorRecord {
    pub staked_amount: u128,
    pub amount_per_slot: u128,
    pub max_slots: u32,
    pub free_slots: u32,
    /// Slots lost to slashing while they were reserved. Each one is removed
    /// from `max_slots` when its reservation comes back instead of being
    /// freed.
    pub pending_slot_reduction: u32,
    pub registered_at: Timestamp,
}

impl ActorRecord {
    pub fn new(slots: u32, amount_per_slot: u128, staked_amount: u128, now: Timestamp) -> Self {
        Self {
            staked_amount,
            amount_per_slot,
            max_slots: slots,
            free_slots: slots,
            pending_slot_reduction: 0,
            registered_at: now,
        }
    }

    pub fn reserved_slots(&self) -> u32 {
        self.max_slots - self.free_slots
    }

    /// Capacity once every pending reduction has been applied.
    pub fn effective_max_slots(&self) -> u32 {
        self.max_slots - self.pending_slot_reduction
    }

    pub fn is_idle(&self) -> bool {
        self.free_slots == self.max_slots
    }

    pub(crate) fn take_slot(&mut self) -> bool {
        if self.free_slots == 0 {
            return false;
        }
        self.free_slots -= 1;
        true
    }

    pub(crate) fn return_slot(&mut self) -> bool {
        if self.free_slots >= self.max_slots {
            return false;
        }
        if self.pending_slot_reduction > 0 {
            self.pending_slot_reduction -= 1;
            self.max_slots -= 1;
        } else {
            self.free_slots += 1;
        }
        true
    }

    /// Shrink capacity by `slots`, taking free slots first and deferring the
    /// rest until reserved slots come back. Returns the number of slots
    /// actually removed or deferred.
    pub(crate) fn shrink(&mut self, slots: u32) -> u32 {
        let slots = slots.min(self.effective_max_slots());
        let from_free = slots.min(self.free_slots);
        self.free_slots -= from_free;
        self.max_slots -= from_free;
        self.pending_slot_reduction += slots - from_free;
        slots
    }
}
