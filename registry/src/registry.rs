//! The actor table and its slot accounting.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::RangeInclusive;
use std::sync::Arc;

use attest_stake::{SlashMode, SlashOutcome, StakeVault};
use attest_store::EventLog;
use attest_types::{ActorId, AuditEvent, StakeId, Timestamp};
use parking_lot::{Mutex, MutexGuard};

use crate::error::RegistryError;
use crate::record::ActorRecord;
use crate::selection::ActorSelector;

#[derive(Default)]
struct RegistryState {
    actors: BTreeMap<(StakeId, ActorId), ActorRecord>,
    operators: HashSet<ActorId>,
}

impl RegistryState {
    fn require_operator(&self, caller: &ActorId) -> Result<(), RegistryError> {
        if self.operators.contains(caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized(*caller))
        }
    }

    fn record(&self, stake_id: StakeId, actor: ActorId) -> Result<&ActorRecord, RegistryError> {
        self.actors
            .get(&(stake_id, actor))
            .ok_or(RegistryError::NotRegistered { stake_id, actor })
    }

    fn record_mut(
        &mut self,
        stake_id: StakeId,
        actor: ActorId,
    ) -> Result<&mut ActorRecord, RegistryError> {
        self.actors
            .get_mut(&(stake_id, actor))
            .ok_or(RegistryError::NotRegistered { stake_id, actor })
    }

    fn pool(&self, stake_id: StakeId) -> impl Iterator<Item = (&ActorId, &ActorRecord)> + '_ {
        self.actors
            .range(pool_range(stake_id))
            .map(|((_, actor), record)| (actor, record))
    }

    fn available(&self, stake_id: StakeId) -> Vec<ActorId> {
        self.pool(stake_id)
            .filter(|(_, record)| record.free_slots > 0)
            .map(|(actor, _)| *actor)
            .collect()
    }
}

fn pool_range(stake_id: StakeId) -> RangeInclusive<(StakeId, ActorId)> {
    (stake_id, ActorId::new([0x00; 32]))..=(stake_id, ActorId::new([0xFF; 32]))
}

fn unique(actors: &[ActorId]) -> Result<(), RegistryError> {
    let mut seen = BTreeSet::new();
    for actor in actors {
        if !seen.insert(*actor) {
            return Err(RegistryError::DuplicateActor(*actor));
        }
    }
    Ok(())
}

/// Tracks registered actors' capacity per pool, backed by the stake vault.
///
/// One lock guards the whole table so a multi-actor reservation is checked
/// and applied as a unit. The registry calls into the vault while holding
/// that lock; the vault never calls back.
pub struct ActorRegistry {
    account: ActorId,
    vault: Arc<StakeVault>,
    events: Arc<dyn EventLog>,
    state: Mutex<RegistryState>,
}

impl ActorRegistry {
    /// `account` is the identity the registry uses towards the vault; the
    /// vault must have authorized it before stake can be released or slashed.
    pub fn new(vault: Arc<StakeVault>, account: ActorId, events: Arc<dyn EventLog>) -> Self {
        Self {
            account,
            vault,
            events,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn account(&self) -> ActorId {
        self.account
    }

    pub fn vault(&self) -> &Arc<StakeVault> {
        &self.vault
    }

    /// Allow `operator` (a pool account) to change slot counts and slash.
    pub fn authorize(&self, operator: ActorId) {
        if self.state.lock().operators.insert(operator) {
            tracing::info!(operator = %operator, "registry operator authorized");
        }
    }

    pub fn is_operator(&self, caller: &ActorId) -> bool {
        self.state.lock().operators.contains(caller)
    }

    /// Stake `slots * amount_per_slot` for `actor` and open `slots` slots.
    ///
    /// Only the actor itself or an authorized operator may register.
    pub fn register(
        &self,
        caller: &ActorId,
        actor: ActorId,
        slots: u32,
        stake_id: StakeId,
        amount_per_slot: u128,
        now: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        if *caller != actor {
            state.require_operator(caller)?;
        }
        if state.actors.contains_key(&(stake_id, actor)) {
            return Err(RegistryError::AlreadyRegistered { stake_id, actor });
        }
        if slots == 0 {
            return Err(RegistryError::ZeroSlots);
        }
        let amount = (slots as u128)
            .checked_mul(amount_per_slot)
            .ok_or(RegistryError::StakeOverflow {
                slots,
                amount_per_slot,
            })?;

        self.vault.stake(stake_id, actor, amount)?;
        state.actors.insert(
            (stake_id, actor),
            ActorRecord::new(slots, amount_per_slot, amount, now),
        );
        drop(state);

        tracing::info!(
            stake_id = %stake_id,
            actor = %actor,
            slots,
            amount_per_slot,
            "actor registered"
        );
        self.events.append(AuditEvent::ActorRegistered {
            stake_id,
            actor,
            slots,
            amount_per_slot,
        });
        Ok(())
    }

    /// Release the actor's remaining stake and delete its record.
    ///
    /// Fails with `SlotsInUse` while any slot is reserved.
    pub fn deregister(
        &self,
        caller: &ActorId,
        actor: ActorId,
        stake_id: StakeId,
    ) -> Result<u128, RegistryError> {
        let mut state = self.state.lock();
        if *caller != actor {
            state.require_operator(caller)?;
        }
        let record = state.record(stake_id, actor)?;
        if !record.is_idle() {
            return Err(RegistryError::SlotsInUse {
                actor,
                free_slots: record.free_slots,
                max_slots: record.max_slots,
            });
        }

        let released = self.vault.release_all(&self.account, stake_id, actor)?;
        state.actors.remove(&(stake_id, actor));
        drop(state);

        tracing::info!(stake_id = %stake_id, actor = %actor, released, "actor deregistered");
        self.events.append(AuditEvent::ActorDeregistered {
            stake_id,
            actor,
            released,
        });
        Ok(released)
    }

    /// Reserve one slot. Returns the free slots left.
    pub fn decrement_actor_slots(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
    ) -> Result<u32, RegistryError> {
        let mut state = self.state.lock();
        state.require_operator(caller)?;
        let record = state.record_mut(stake_id, actor)?;
        if !record.take_slot() {
            return Err(RegistryError::NoFreeSlots(actor));
        }
        let (free_slots, max_slots) = (record.free_slots, record.max_slots);
        drop(state);

        self.slots_changed(stake_id, actor, free_slots, max_slots);
        Ok(free_slots)
    }

    /// Return one reserved slot. Returns the free slots afterwards.
    ///
    /// A slot lost to slashing while it was reserved is retired here instead
    /// of being freed.
    pub fn increment_actor_slots(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
    ) -> Result<u32, RegistryError> {
        let mut state = self.state.lock();
        state.require_operator(caller)?;
        let record = state.record_mut(stake_id, actor)?;
        if !record.return_slot() {
            return Err(RegistryError::SlotOverflow(actor));
        }
        let (free_slots, max_slots) = (record.free_slots, record.max_slots);
        drop(state);

        self.slots_changed(stake_id, actor, free_slots, max_slots);
        Ok(free_slots)
    }

    /// Reserve one slot from each of `actors`, all or nothing.
    pub fn reserve(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actors: &[ActorId],
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        state.require_operator(caller)?;
        unique(actors)?;
        for actor in actors {
            if state.record(stake_id, *actor)?.free_slots == 0 {
                return Err(RegistryError::NoFreeSlots(*actor));
            }
        }
        let changes = Self::apply(&mut state, stake_id, actors, ActorRecord::take_slot);
        drop(state);

        for (actor, free_slots, max_slots) in changes {
            self.slots_changed(stake_id, actor, free_slots, max_slots);
        }
        Ok(())
    }

    /// Select `count` actors with free slots, ranked by `seed`, and reserve
    /// one slot from each. Selection and reservation happen under one lock.
    pub fn reserve_selected(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        count: usize,
        seed: &[u8],
    ) -> Result<Vec<ActorId>, RegistryError> {
        let mut state = self.state.lock();
        state.require_operator(caller)?;
        let available = state.available(stake_id);
        if available.len() < count {
            return Err(RegistryError::InsufficientRegistrants {
                needed: count,
                available: available.len(),
            });
        }
        let chosen = ActorSelector.select(&available, seed, count);
        let changes = Self::apply(&mut state, stake_id, &chosen, ActorRecord::take_slot);
        drop(state);

        for (actor, free_slots, max_slots) in changes {
            self.slots_changed(stake_id, actor, free_slots, max_slots);
        }
        Ok(chosen)
    }

    /// Return one reserved slot to each of `actors`, all or nothing.
    pub fn release_reservation(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actors: &[ActorId],
    ) -> Result<(), RegistryError> {
        let mut state = self.state.lock();
        state.require_operator(caller)?;
        unique(actors)?;
        for actor in actors {
            if state.record(stake_id, *actor)?.is_idle() {
                return Err(RegistryError::SlotOverflow(*actor));
            }
        }
        let changes = Self::apply(&mut state, stake_id, actors, ActorRecord::return_slot);
        drop(state);

        for (actor, free_slots, max_slots) in changes {
            self.slots_changed(stake_id, actor, free_slots, max_slots);
        }
        Ok(())
    }

    /// Slash `amount` of `actor`'s stake through the vault.
    ///
    /// With `reduce_max_slots`, capacity shrinks by
    /// `ceil(amount / amount_per_slot)` slots: free slots go at once and the
    /// rest are retired as reserved slots come back.
    pub fn slash_actor(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
        amount: u128,
        reduce_max_slots: bool,
        mode: &SlashMode,
    ) -> Result<SlashOutcome, RegistryError> {
        let state = self.state.lock();
        state.require_operator(caller)?;
        state.record(stake_id, actor)?;
        self.slash_locked(state, stake_id, actor, amount, reduce_max_slots, mode)
    }

    /// Slash one slot's worth of stake, capped at what the actor still has,
    /// and retire that slot. The amount is read under the same lock as the
    /// slash. Returns `None` for an actor with nothing left to lose.
    pub fn slash_slot(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
        mode: &SlashMode,
    ) -> Result<Option<SlashOutcome>, RegistryError> {
        let state = self.state.lock();
        state.require_operator(caller)?;
        let record = state.record(stake_id, actor)?;
        let amount = record.amount_per_slot.min(record.staked_amount);
        if amount == 0 {
            return Ok(None);
        }
        self.slash_locked(state, stake_id, actor, amount, true, mode)
            .map(Some)
    }

    fn slash_locked(
        &self,
        mut state: MutexGuard<'_, RegistryState>,
        stake_id: StakeId,
        actor: ActorId,
        amount: u128,
        reduce_max_slots: bool,
        mode: &SlashMode,
    ) -> Result<SlashOutcome, RegistryError> {
        let outcome = self
            .vault
            .slash(&self.account, stake_id, actor, amount, mode)?;
        let record = state.record_mut(stake_id, actor)?;
        record.staked_amount = record.staked_amount.saturating_sub(amount);
        let shrunk = if reduce_max_slots && record.amount_per_slot > 0 {
            let slots = amount.div_ceil(record.amount_per_slot);
            record.shrink(u32::try_from(slots).unwrap_or(u32::MAX))
        } else {
            0
        };
        let (free_slots, max_slots, pending) = (
            record.free_slots,
            record.max_slots,
            record.pending_slot_reduction,
        );
        drop(state);

        tracing::warn!(
            stake_id = %stake_id,
            actor = %actor,
            amount,
            slots_lost = shrunk,
            pending_slot_reduction = pending,
            "actor slashed"
        );
        if shrunk > 0 {
            self.slots_changed(stake_id, actor, free_slots, max_slots);
        }
        Ok(outcome)
    }

    /// Actors in `stake_id` with at least one free slot, in id order.
    pub fn get_available_registrants(&self, stake_id: StakeId) -> Vec<ActorId> {
        self.state.lock().available(stake_id)
    }

    /// Every actor registered in `stake_id`, in id order.
    pub fn registrants(&self, stake_id: StakeId) -> Vec<ActorId> {
        self.state
            .lock()
            .pool(stake_id)
            .map(|(actor, _)| *actor)
            .collect()
    }

    pub fn is_registered(&self, stake_id: StakeId, actor: &ActorId) -> bool {
        self.state.lock().actors.contains_key(&(stake_id, *actor))
    }

    pub fn actor(&self, stake_id: StakeId, actor: &ActorId) -> Option<ActorRecord> {
        self.state.lock().actors.get(&(stake_id, *actor)).cloned()
    }

    fn apply(
        state: &mut RegistryState,
        stake_id: StakeId,
        actors: &[ActorId],
        op: fn(&mut ActorRecord) -> bool,
    ) -> Vec<(ActorId, u32, u32)> {
        actors
            .iter()
            .filter_map(|actor| {
                let record = state.actors.get_mut(&(stake_id, *actor))?;
                op(record);
                Some((*actor, record.free_slots, record.max_slots))
            })
            .collect()
    }

    fn slots_changed(&self, stake_id: StakeId, actor: ActorId, free_slots: u32, max_slots: u32) {
        tracing::debug!(
            stake_id = %stake_id,
            actor = %actor,
            free_slots,
            max_slots,
            "slots changed"
        );
        self.events.append(AuditEvent::SlotsChanged {
            stake_id,
            actor,
            free_slots,
            max_slots,
        });
    }
}
