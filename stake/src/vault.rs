//! Custody of staked collateral.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use attest_store::EventLog;
use attest_types::{ActorId, AuditEvent, StakeEventKind, StakeId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::StakeError;
use crate::ledger::TokenLedger;

/// What happens to slashed stake.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashMode {
    /// Destroy the slashed amount.
    Burn,
    /// Split the slashed amount equally across the honest cohort.
    ///
    /// The slashed actor is never paid from its own slash. Whatever does not
    /// divide evenly is burned, and so is everything when the cohort is empty.
    Redistribute(Vec<ActorId>),
}

/// Where a slashed amount went.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashOutcome {
    pub slashed: u128,
    pub redistributed: Vec<(ActorId, u128)>,
    pub burned: u128,
}

#[derive(Default)]
struct VaultState {
    records: HashMap<(StakeId, ActorId), u128>,
    totals: HashMap<StakeId, u128>,
    operators: HashSet<ActorId>,
}

impl VaultState {
    fn stake_of(&self, stake_id: &StakeId, actor: &ActorId) -> u128 {
        self.records.get(&(*stake_id, *actor)).copied().unwrap_or(0)
    }

    fn credit(&mut self, stake_id: StakeId, actor: ActorId, amount: u128) {
        *self.records.entry((stake_id, actor)).or_insert(0) += amount;
        *self.totals.entry(stake_id).or_insert(0) += amount;
    }

    /// Caller has checked `amount <= stake_of(stake_id, actor)`.
    fn debit(&mut self, stake_id: StakeId, actor: ActorId, amount: u128) {
        let key = (stake_id, actor);
        if let Some(record) = self.records.get_mut(&key) {
            *record -= amount;
            if *record == 0 {
                self.records.remove(&key);
            }
        }
        if let Some(total) = self.totals.get_mut(&stake_id) {
            *total -= amount;
            if *total == 0 {
                self.totals.remove(&stake_id);
            }
        }
    }

    fn ensure_stake(
        &self,
        stake_id: &StakeId,
        actor: &ActorId,
        amount: u128,
    ) -> Result<(), StakeError> {
        let available = self.stake_of(stake_id, actor);
        if available < amount {
            return Err(StakeError::InsufficientStake {
                stake_id: *stake_id,
                actor: *actor,
                needed: amount,
                available,
            });
        }
        Ok(())
    }
}

/// Holds staked tokens in its own ledger account and tracks who staked what.
///
/// Anyone may stake for themselves. Release and slash are restricted to
/// authorized operators (the actor registry).
pub struct StakeVault {
    account: ActorId,
    ledger: Arc<dyn TokenLedger>,
    events: Arc<dyn EventLog>,
    state: Mutex<VaultState>,
}

impl StakeVault {
    pub fn new(ledger: Arc<dyn TokenLedger>, account: ActorId, events: Arc<dyn EventLog>) -> Self {
        Self {
            account,
            ledger,
            events,
            state: Mutex::new(VaultState::default()),
        }
    }

    /// The vault's custody account on the ledger. Stakers approve this
    /// account before calling [`stake`](Self::stake).
    pub fn account(&self) -> ActorId {
        self.account
    }

    /// Allow `operator` to release and slash stake.
    pub fn authorize(&self, operator: ActorId) {
        if self.state.lock().operators.insert(operator) {
            tracing::info!(operator = %operator, "vault operator authorized");
        }
    }

    pub fn is_authorized(&self, operator: &ActorId) -> bool {
        self.state.lock().operators.contains(operator)
    }

    /// Pull `amount` from `staker` into custody under `stake_id`.
    ///
    /// The staker must have approved the vault's account for at least
    /// `amount` and hold that much on the ledger.
    pub fn stake(&self, stake_id: StakeId, staker: ActorId, amount: u128) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let mut state = self.state.lock();
        let allowance = self.ledger.allowance(&staker, &self.account);
        let balance = self.ledger.balance_of(&staker);
        if allowance < amount || balance < amount {
            return Err(StakeError::InsufficientBalance {
                needed: amount,
                available: allowance.min(balance),
            });
        }
        self.ledger
            .transfer_from(&self.account, &staker, &self.account, amount)?;
        state.credit(stake_id, staker, amount);
        drop(state);

        tracing::debug!(stake_id = %stake_id, actor = %staker, amount, "stake deposited");
        self.record(stake_id, staker, amount, StakeEventKind::Staked);
        Ok(())
    }

    /// Return `amount` of `actor`'s stake to their ledger balance.
    pub fn release(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
        amount: u128,
    ) -> Result<(), StakeError> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let mut state = self.state.lock();
        if !state.operators.contains(caller) {
            return Err(StakeError::Unauthorized(*caller));
        }
        state.ensure_stake(&stake_id, &actor, amount)?;
        self.ledger.transfer(&self.account, &actor, amount)?;
        state.debit(stake_id, actor, amount);
        drop(state);

        tracing::debug!(stake_id = %stake_id, actor = %actor, amount, "stake released");
        self.record(stake_id, actor, amount, StakeEventKind::Released);
        Ok(())
    }

    /// Release everything `actor` has staked under `stake_id`. Returns the
    /// amount paid out, which is zero when there was nothing to release.
    pub fn release_all(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
    ) -> Result<u128, StakeError> {
        let amount = {
            let state = self.state.lock();
            if !state.operators.contains(caller) {
                return Err(StakeError::Unauthorized(*caller));
            }
            state.stake_of(&stake_id, &actor)
        };
        if amount == 0 {
            return Ok(0);
        }
        self.release(caller, stake_id, actor, amount)?;
        Ok(amount)
    }

    /// Remove `amount` from `actor`'s stake, burning or redistributing it.
    pub fn slash(
        &self,
        caller: &ActorId,
        stake_id: StakeId,
        actor: ActorId,
        amount: u128,
        mode: &SlashMode,
    ) -> Result<SlashOutcome, StakeError> {
        if amount == 0 {
            return Err(StakeError::ZeroAmount);
        }
        let mut state = self.state.lock();
        if !state.operators.contains(caller) {
            return Err(StakeError::Unauthorized(*caller));
        }
        state.ensure_stake(&stake_id, &actor, amount)?;

        let cohort: Vec<ActorId> = match mode {
            SlashMode::Burn => Vec::new(),
            SlashMode::Redistribute(cohort) => cohort
                .iter()
                .copied()
                .filter(|member| *member != actor)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect(),
        };
        let share = match cohort.len() {
            0 => 0,
            n => amount / n as u128,
        };
        let burned = amount - share * cohort.len() as u128;

        // Custody holds at least `amount` for this record, so every payout
        // below is covered.
        let mut outcome = SlashOutcome {
            slashed: amount,
            redistributed: Vec::with_capacity(cohort.len()),
            burned,
        };
        if share > 0 {
            for member in &cohort {
                self.ledger.transfer(&self.account, member, share)?;
                outcome.redistributed.push((*member, share));
            }
        }
        if burned > 0 {
            self.ledger.burn(&self.account, burned)?;
        }
        state.debit(stake_id, actor, amount);
        drop(state);

        tracing::warn!(
            stake_id = %stake_id,
            actor = %actor,
            amount,
            redistributed_to = outcome.redistributed.len(),
            burned,
            "stake slashed"
        );
        self.record(stake_id, actor, amount, StakeEventKind::Slashed);
        for (member, share) in &outcome.redistributed {
            self.record(stake_id, *member, *share, StakeEventKind::Redistributed);
        }
        if burned > 0 {
            self.record(stake_id, actor, burned, StakeEventKind::Burned);
        }
        Ok(outcome)
    }

    pub fn stake_of(&self, stake_id: &StakeId, actor: &ActorId) -> u128 {
        self.state.lock().stake_of(stake_id, actor)
    }

    pub fn total_staked(&self, stake_id: &StakeId) -> u128 {
        self.state.lock().totals.get(stake_id).copied().unwrap_or(0)
    }

    /// Sum of every stake record across all stake ids.
    pub fn custody_total(&self) -> u128 {
        self.state.lock().totals.values().sum()
    }

    fn record(&self, stake_id: StakeId, actor: ActorId, amount: u128, kind: StakeEventKind) {
        self.events.append(AuditEvent::Stake {
            stake_id,
            actor,
            amount,
            kind,
        });
    }
}
