//! Challenge lifecycle on top of the commit-reveal engine.

use std::collections::HashSet;
use std::sync::Arc;

use attest_commit_reveal::{CommitRevealEngine, CommitmentResult};
use attest_registry::{ActorRegistry, RegistryError};
use attest_stake::SlashMode;
use attest_store::{EventLog, InsertError, KeyedStore};
use attest_types::{
    ActorId, AuditEvent, ChallengeId, CommitmentId, DataRef, ModelId, StakeId, Timestamp,
};
use parking_lot::RwLock;

use crate::challenge::{Challenge, ChallengeOutcome, ChallengeState, Verdict};
use crate::config::VerifierPoolConfig;
use crate::error::VerifierError;

/// Verified iff the vote passed and, when full participation is required,
/// nobody abstained.
fn verdict(result: &CommitmentResult, require_full_participation: bool) -> Verdict {
    if result.passed() && (!require_full_participation || result.abstained == 0) {
        Verdict::Verified
    } else {
        Verdict::Rejected
    }
}

pub struct VerifierPool {
    account: ActorId,
    stake_id: StakeId,
    config: VerifierPoolConfig,
    registry: Arc<ActorRegistry>,
    engine: Arc<CommitRevealEngine>,
    challenges: KeyedStore<ChallengeId, Challenge>,
    requesters: RwLock<HashSet<ActorId>>,
    events: Arc<dyn EventLog>,
}

impl VerifierPool {
    /// `account` is the pool's identity towards the registry, which must
    /// have authorized it.
    pub fn new(
        account: ActorId,
        config: VerifierPoolConfig,
        registry: Arc<ActorRegistry>,
        engine: Arc<CommitRevealEngine>,
        events: Arc<dyn EventLog>,
    ) -> Self {
        Self {
            account,
            stake_id: StakeId::for_pool(&account),
            config,
            registry,
            engine,
            challenges: KeyedStore::new(),
            requesters: RwLock::new(HashSet::new()),
            events,
        }
    }

    pub fn account(&self) -> ActorId {
        self.account
    }

    pub fn stake_id(&self) -> StakeId {
        self.stake_id
    }

    pub fn config(&self) -> &VerifierPoolConfig {
        &self.config
    }

    /// The engine verifiers commit and reveal through.
    pub fn engine(&self) -> &Arc<CommitRevealEngine> {
        &self.engine
    }

    /// Allow `requester` to open challenges.
    pub fn authorize_requester(&self, requester: ActorId) {
        if self.requesters.write().insert(requester) {
            tracing::info!(requester = %requester, "verifier pool requester authorized");
        }
    }

    // ── Verifier membership ─────────────────────────────────────────────

    pub fn register_verifier(
        &self,
        actor: ActorId,
        amount_per_slot: u128,
        slots: u32,
        now: Timestamp,
    ) -> Result<(), VerifierError> {
        let minimum = u128::from(self.config.min_stake_per_slot);
        if amount_per_slot < minimum {
            return Err(VerifierError::StakeTooLow {
                amount_per_slot,
                minimum,
            });
        }
        if slots == 0 || slots > self.config.max_slots_per_verifier {
            return Err(VerifierError::InvalidSlots {
                slots,
                maximum: self.config.max_slots_per_verifier,
            });
        }
        self.registry
            .register(&self.account, actor, slots, self.stake_id, amount_per_slot, now)?;
        Ok(())
    }

    /// Fails with `SlotsInUse` while the verifier is reserved by an
    /// unresolved challenge.
    pub fn deregister_verifier(&self, actor: ActorId) -> Result<u128, VerifierError> {
        Ok(self
            .registry
            .deregister(&self.account, actor, self.stake_id)?)
    }

    pub fn is_registered_verifier(&self, actor: &ActorId) -> bool {
        self.registry.is_registered(self.stake_id, actor)
    }

    pub fn get_available_verifiers(&self) -> Vec<ActorId> {
        self.registry.get_available_registrants(self.stake_id)
    }

    // ── Challenges ──────────────────────────────────────────────────────

    /// Open a challenge and reserve `k_verifiers` verifiers for it.
    #[allow(clippy::too_many_arguments)]
    pub fn init_challenge(
        &self,
        caller: &ActorId,
        model_id: ModelId,
        challenge_id: ChallengeId,
        wall_time_secs: u64,
        k_verifiers: usize,
        testing_data: DataRef,
        now: Timestamp,
    ) -> Result<Vec<ActorId>, VerifierError> {
        if !self.requesters.read().contains(caller) {
            return Err(VerifierError::Unauthorized(*caller));
        }
        if k_verifiers < self.config.min_k_verifiers {
            return Err(VerifierError::BelowMinimumQuorum {
                k: k_verifiers,
                min_k: self.config.min_k_verifiers,
            });
        }
        if wall_time_secs == 0 {
            return Err(VerifierError::InvalidWallTime);
        }

        let record = self
            .challenges
            .insert_with(challenge_id, || {
                let reserved = self
                    .registry
                    .reserve_selected(
                        &self.account,
                        self.stake_id,
                        k_verifiers,
                        challenge_id.as_bytes(),
                    )
                    .map_err(|e| match e {
                        RegistryError::InsufficientRegistrants { needed, available } => {
                            VerifierError::InsufficientVerifiers { needed, available }
                        }
                        other => VerifierError::Registry(other),
                    })?;
                Ok(Challenge {
                    id: challenge_id,
                    model_id,
                    requester: *caller,
                    wall_deadline: now.plus_secs(wall_time_secs),
                    k_verifiers,
                    testing_data,
                    reserved,
                    commitment_id: None,
                    state: ChallengeState::Created,
                    outcome: None,
                    created_at: now,
                })
            })
            .map_err(|e| match e {
                InsertError::Duplicate => VerifierError::DuplicateIdentifier(challenge_id),
                InsertError::Init(e) => e,
            })?;
        let verifiers = record.lock().reserved.clone();

        tracing::info!(
            challenge = %challenge_id,
            model = %model_id,
            requester = %caller,
            k_verifiers,
            wall_time_secs,
            "challenge initialized"
        );
        self.events.append(AuditEvent::ChallengeInitialized {
            challenge_id,
            model_id,
            requester: *caller,
            verifiers: verifiers.clone(),
        });
        Ok(verifiers)
    }

    /// Start the vote among the reserved verifiers.
    ///
    /// The first call sets up the commitment with the pool's commit and
    /// reveal timeouts; later calls return the same commitment id.
    pub fn start_commit_reveal_phase(
        &self,
        caller: &ActorId,
        challenge_id: ChallengeId,
        now: Timestamp,
    ) -> Result<CommitmentId, VerifierError> {
        let (commitment_id, started) = self.with_challenge(challenge_id, |challenge| {
            if !challenge.is_reserved(caller) {
                return Err(VerifierError::Unauthorized(*caller));
            }
            if let Some(id) = challenge.commitment_id {
                return Ok((id, false));
            }
            if challenge.state == ChallengeState::Expired || now >= challenge.wall_deadline {
                return Err(VerifierError::ChallengeExpired {
                    deadline: challenge.wall_deadline,
                });
            }
            let id = CommitmentId::for_challenge(&challenge_id);
            self.engine.setup(
                id,
                self.config.commit_timeout_secs,
                self.config.reveal_timeout_secs,
                &challenge.reserved,
                now,
            )?;
            challenge.commitment_id = Some(id);
            challenge.state = ChallengeState::CommitRevealActive;
            Ok((id, true))
        })?;

        if started {
            tracing::info!(
                challenge = %challenge_id,
                commitment = %commitment_id,
                caller = %caller,
                "commit-reveal phase started"
            );
            self.events.append(AuditEvent::CommitRevealStarted {
                challenge_id,
                commitment_id,
                caller: *caller,
            });
        }
        Ok(commitment_id)
    }

    /// Resolve the challenge from its commitment result.
    ///
    /// The first successful call slashes each loser one slot's worth of
    /// stake, shared among the winners, then returns every reserved slot and
    /// records the verdict. A failed slash leaves the challenge unresolved.
    /// Later calls return the stored outcome.
    pub fn get_commit_reveal_results(
        &self,
        challenge_id: ChallengeId,
        now: Timestamp,
    ) -> Result<ChallengeOutcome, VerifierError> {
        let (outcome, fresh) = self.with_challenge(challenge_id, |challenge| {
            if let Some(outcome) = &challenge.outcome {
                return Ok((outcome.clone(), false));
            }
            let Some(commitment_id) = challenge.commitment_id else {
                return Err(VerifierError::ChallengeNotStarted(challenge_id));
            };
            let result = self.engine.get_commitment_result(commitment_id, now)?;
            let verdict = verdict(&result, self.config.require_full_participation);

            let winners: Vec<ActorId> = challenge
                .reserved
                .iter()
                .filter(|v| !result.losers.contains(v))
                .copied()
                .collect();
            // Losers still hold their reserved slot here, so none of them can
            // deregister before the penalty lands.
            let slashed = self.slash_losers(&result.losers, winners)?;
            self.registry
                .release_reservation(&self.account, self.stake_id, &challenge.reserved)?;

            let outcome = ChallengeOutcome {
                verdict,
                result,
                slashed,
            };
            challenge.state = ChallengeState::Resolved(verdict);
            challenge.outcome = Some(outcome.clone());
            Ok((outcome, true))
        })?;

        if fresh {
            tracing::info!(
                challenge = %challenge_id,
                verdict = ?outcome.verdict,
                votes_for = outcome.result.votes_for,
                abstained = outcome.result.abstained,
                slashed = outcome.slashed.len(),
                "challenge resolved"
            );
            self.events.append(AuditEvent::ChallengeResolved {
                challenge_id,
                verified: outcome.verdict == Verdict::Verified,
                slashed: outcome.slashed.clone(),
            });
        }
        Ok(outcome)
    }

    /// Return the reservations of a challenge whose wall time ran out before
    /// its vote started.
    pub fn expire_challenge(
        &self,
        challenge_id: ChallengeId,
        now: Timestamp,
    ) -> Result<(), VerifierError> {
        let released = self.with_challenge(challenge_id, |challenge| {
            match challenge.state {
                ChallengeState::Created => {}
                ChallengeState::Expired | ChallengeState::Resolved(_) => {
                    return Err(VerifierError::AlreadyResolved(challenge_id))
                }
                ChallengeState::CommitRevealActive => {
                    return Err(VerifierError::ChallengeNotExpired {
                        deadline: challenge.wall_deadline,
                    })
                }
            }
            if now < challenge.wall_deadline {
                return Err(VerifierError::ChallengeNotExpired {
                    deadline: challenge.wall_deadline,
                });
            }
            self.registry
                .release_reservation(&self.account, self.stake_id, &challenge.reserved)?;
            challenge.state = ChallengeState::Expired;
            Ok(challenge.reserved.clone())
        })?;
        tracing::info!(
            challenge = %challenge_id,
            released = released.len(),
            "challenge expired before voting"
        );
        self.events.append(AuditEvent::ChallengeExpired {
            challenge_id,
            released,
        });
        Ok(())
    }

    // ── Queries ─────────────────────────────────────────────────────────

    /// Whether the challenge resolved as verified. Unknown or unresolved
    /// challenges are not.
    pub fn is_verified_proof(&self, challenge_id: &ChallengeId) -> bool {
        self.challenges
            .with(challenge_id, |c| c.is_verified())
            .unwrap_or(false)
    }

    pub fn does_challenge_exist(&self, challenge_id: &ChallengeId) -> bool {
        self.challenges.contains(challenge_id)
    }

    pub fn challenge(&self, challenge_id: &ChallengeId) -> Option<Challenge> {
        self.challenges.snapshot(challenge_id)
    }

    pub fn commitment_id(&self, challenge_id: &ChallengeId) -> Option<CommitmentId> {
        self.challenges
            .with(challenge_id, |c| c.commitment_id)
            .flatten()
    }

    pub fn challenge_count(&self) -> usize {
        self.challenges.len()
    }

    /// Challenges still waiting for their vote after the wall deadline.
    pub fn stale_challenges(&self, now: Timestamp) -> Vec<ChallengeId> {
        self.challenges
            .keys()
            .into_iter()
            .filter(|id| {
                self.challenges
                    .with(id, |c| c.state == ChallengeState::Created && now >= c.wall_deadline)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn slash_losers(
        &self,
        losers: &[ActorId],
        winners: Vec<ActorId>,
    ) -> Result<Vec<ActorId>, VerifierError> {
        let mode = SlashMode::Redistribute(winners);
        let mut slashed = Vec::with_capacity(losers.len());
        for loser in losers {
            if self
                .registry
                .slash_slot(&self.account, self.stake_id, *loser, &mode)?
                .is_some()
            {
                slashed.push(*loser);
            }
        }
        Ok(slashed)
    }

    fn with_challenge<R>(
        &self,
        challenge_id: ChallengeId,
        f: impl FnOnce(&mut Challenge) -> Result<R, VerifierError>,
    ) -> Result<R, VerifierError> {
        self.challenges
            .with(&challenge_id, f)
            .unwrap_or(Err(VerifierError::ChallengeNotFound(challenge_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attest_commit_reveal::Outcome;

    fn result(outcome: Outcome, abstained: usize) -> CommitmentResult {
        CommitmentResult {
            outcome,
            votes_for: 2,
            votes_against: 0,
            abstained,
            losers: Vec::new(),
        }
    }

    #[test]
    fn verdict_requires_pass() {
        assert_eq!(verdict(&result(Outcome::Failed, 0), false), Verdict::Rejected);
        assert_eq!(verdict(&result(Outcome::Passed, 0), true), Verdict::Verified);
    }

    #[test]
    fn abstention_blocks_verification_only_under_full_participation() {
        assert_eq!(verdict(&result(Outcome::Passed, 1), true), Verdict::Rejected);
        assert_eq!(verdict(&result(Outcome::Passed, 1), false), Verdict::Verified);
    }
}
