//! Scripted end-to-end runs against an in-memory ledger and a manual clock.
//!
//! A [`Simulation`] owns an [`AttestNode`] wired to a [`MemoryLedger`] and a
//! [`NullClock`]. Each run funds and registers fresh actors, drives one
//! channel or challenge to its terminal state and reports what happened.

use std::sync::Arc;

use serde::Serialize;

use attest_commit_reveal::commit_hash;
use attest_crypto::{blake2b_256_multi, keypair_from_seed, sign_message};
use attest_gossipers::{proof_message, Ed25519ProofVerifier};
use attest_nullables::{MemoryLedger, NullClock};
use attest_stake::TokenLedger;
use attest_types::{ActorId, ChallengeId, ChannelId, Clock, DataRef, Digest, KeyPair, ModelId};
use attest_verifiers::Verdict;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::node::AttestNode;

const START_SECS: u64 = 1_000;
const END_OF_TRAINING: &str = "end of training";

#[derive(Clone, Debug)]
pub struct TrainingScenario {
    pub gossipers: u8,
    pub required_k: usize,
    pub threshold_m: usize,
    /// Reserved gossipers that sign a different result.
    pub dissenters: usize,
    /// Reserved gossipers that never submit.
    pub silent: usize,
    pub stake_per_slot: u128,
}

impl Default for TrainingScenario {
    fn default() -> Self {
        Self {
            gossipers: 3,
            required_k: 3,
            threshold_m: 3,
            dissenters: 0,
            silent: 0,
            stake_per_slot: 100,
        }
    }
}

#[derive(Clone, Debug)]
pub struct VerificationScenario {
    pub verifiers: u8,
    pub k_verifiers: usize,
    /// Reserved verifiers that never commit.
    pub abstainers: usize,
    /// Reserved verifiers that vote against the model.
    pub dissenters: usize,
    pub stake_per_slot: u128,
    pub wall_time_secs: u64,
}

impl Default for VerificationScenario {
    fn default() -> Self {
        Self {
            verifiers: 3,
            k_verifiers: 3,
            abstainers: 0,
            dissenters: 0,
            stake_per_slot: 100,
            wall_time_secs: 3_600,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct TrainingReport {
    pub channel_id: String,
    pub proof_id: String,
    pub gossipers: Vec<String>,
    pub submitted: usize,
    pub validated: bool,
    pub terminated: bool,
    pub slashed: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerificationReport {
    pub challenge_id: String,
    pub commitment_id: String,
    pub verifiers: Vec<String>,
    pub verdict: Verdict,
    pub votes_for: usize,
    pub votes_against: usize,
    pub abstained: usize,
    pub slashed: Vec<String>,
}

pub struct Simulation {
    node: AttestNode,
    clock: Arc<NullClock>,
    ledger: Arc<MemoryLedger>,
    requester: ActorId,
    /// Every gossiper key registered so far; later channels may reserve
    /// gossipers from earlier runs.
    gossiper_keys: Vec<KeyPair>,
    runs: u64,
}

impl Simulation {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let clock = Arc::new(NullClock::new(START_SECS));
        let ledger = Arc::new(MemoryLedger::new());
        let node = AttestNode::new(
            config,
            ledger.clone(),
            clock.clone(),
            Arc::new(Ed25519ProofVerifier),
        )?;
        let requester = node
            .accounts()
            .requesters
            .first()
            .copied()
            .ok_or_else(|| NodeError::Simulation("no requester account configured".into()))?;
        Ok(Self {
            node,
            clock,
            ledger,
            requester,
            gossiper_keys: Vec::new(),
            runs: 0,
        })
    }

    pub fn node(&self) -> &AttestNode {
        &self.node
    }

    pub fn clock(&self) -> &NullClock {
        &self.clock
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    /// Open a channel, have the reserved gossipers sign and submit, then
    /// validate and (if validated) terminate it.
    pub fn run_training(&mut self, scenario: &TrainingScenario) -> Result<TrainingReport, NodeError> {
        if scenario.dissenters + scenario.silent > scenario.required_k {
            return Err(NodeError::Simulation(
                "dissenters and silent gossipers exceed required_k".into(),
            ));
        }
        self.runs += 1;
        let run = self.runs;
        let pool = self.node.gossipers().clone();
        let now = self.clock.now();

        for i in 0..scenario.gossipers {
            let kp = actor_keys(b"gossiper", run, i);
            self.fund(&kp.actor_id(), scenario.stake_per_slot);
            pool.register_gossiper(kp.actor_id(), scenario.stake_per_slot, 1, now)?;
            self.gossiper_keys.push(kp);
        }

        let channel_id = ChannelId::from_label(&format!("simulated-channel-{run}"));
        let proof_id = pool.init_channel(
            &self.requester,
            channel_id,
            scenario.required_k,
            scenario.threshold_m,
            self.requester,
            now,
        )?;
        let reserved = pool
            .channel(&channel_id)
            .map(|c| c.reserved)
            .unwrap_or_default();

        let merkle_root: Vec<Digest> = (0..4)
            .map(|i| Digest::from_label(&format!("run-{run}-batch-{i}")))
            .collect();
        let honest = Digest::from_label(&format!("run-{run}-result"));
        let forged = Digest::from_label(&format!("run-{run}-forged"));
        let honest_count = reserved.len() - scenario.dissenters - scenario.silent;

        let mut submitted = 0;
        for (position, gossiper) in reserved.iter().enumerate() {
            if position >= honest_count + scenario.dissenters {
                continue;
            }
            let result = if position < honest_count { honest } else { forged };
            let Some(kp) = self.gossiper_keys.iter().find(|kp| kp.actor_id() == *gossiper) else {
                return Err(NodeError::Simulation(format!("no key for gossiper {gossiper}")));
            };
            let message = proof_message(&channel_id, &merkle_root, END_OF_TRAINING, &result);
            let signature = sign_message(message.as_bytes(), &kp.private);
            pool.submit_proof(
                *gossiper,
                channel_id,
                END_OF_TRAINING,
                merkle_root.clone(),
                signature,
                result,
            )?;
            submitted += 1;
        }

        let validated = pool.validate_proof(channel_id)?;
        let slashed = if validated {
            pool.terminate_channel(&self.requester, channel_id)?
        } else {
            Vec::new()
        };

        Ok(TrainingReport {
            channel_id: channel_id.to_string(),
            proof_id: proof_id.to_string(),
            gossipers: reserved.iter().map(ToString::to_string).collect(),
            submitted,
            validated,
            terminated: pool.is_channel_terminated(&channel_id),
            slashed: slashed.iter().map(ToString::to_string).collect(),
        })
    }

    /// Open a challenge and run its commit-reveal vote to a verdict.
    ///
    /// Reserved verifiers commit concurrently, the clock moves past the
    /// commit window, they reveal concurrently, and the clock moves past
    /// the reveal window when someone abstained.
    pub fn run_verification(
        &mut self,
        scenario: &VerificationScenario,
    ) -> Result<VerificationReport, NodeError> {
        if scenario.abstainers + scenario.dissenters > scenario.k_verifiers {
            return Err(NodeError::Simulation(
                "abstainers and dissenters exceed k_verifiers".into(),
            ));
        }
        self.runs += 1;
        let run = self.runs;
        let pool = self.node.verifiers().clone();
        let engine = self.node.engine().clone();
        let config = pool.config().clone();
        let now = self.clock.now();

        for i in 0..scenario.verifiers {
            let id = actor_keys(b"verifier", run, i).actor_id();
            self.fund(&id, scenario.stake_per_slot);
            pool.register_verifier(id, scenario.stake_per_slot, 1, now)?;
        }

        let challenge_id = ChallengeId::from_label(&format!("simulated-challenge-{run}"));
        let reserved = pool.init_challenge(
            &self.requester,
            ModelId::from_label(&format!("simulated-model-{run}")),
            challenge_id,
            scenario.wall_time_secs,
            scenario.k_verifiers,
            DataRef::from_label(&format!("simulated-testing-data-{run}")),
            now,
        )?;
        let Some(starter) = reserved.first().copied() else {
            return Err(NodeError::Simulation("challenge reserved no verifiers".into()));
        };
        let commitment_id = pool.start_commit_reveal_phase(&starter, challenge_id, now)?;

        let voting: Vec<(ActorId, bool, Vec<u8>)> = reserved
            .iter()
            .skip(scenario.abstainers)
            .enumerate()
            .map(|(i, voter)| {
                let salt = blake2b_256_multi(&[b"attest/sim/salt", voter.as_bytes()]);
                (*voter, i >= scenario.dissenters, salt.to_vec())
            })
            .collect();

        std::thread::scope(|scope| {
            let handles: Vec<_> = voting
                .iter()
                .map(|(voter, vote, value)| {
                    let engine = &engine;
                    scope.spawn(move || {
                        engine.commit(commitment_id, *voter, commit_hash(*vote, value), now)
                    })
                })
                .collect();
            join_all(handles)
        })?;

        self.clock.advance(config.commit_timeout_secs);
        let reveal_at = self.clock.now();
        std::thread::scope(|scope| {
            let handles: Vec<_> = voting
                .iter()
                .map(|(voter, vote, value)| {
                    let engine = &engine;
                    scope.spawn(move || engine.reveal(commitment_id, *voter, value, *vote, reveal_at))
                })
                .collect();
            join_all(handles)
        })?;

        if scenario.abstainers > 0 {
            self.clock.advance(config.reveal_timeout_secs);
        }
        let outcome = pool.get_commit_reveal_results(challenge_id, self.clock.now())?;

        Ok(VerificationReport {
            challenge_id: challenge_id.to_string(),
            commitment_id: commitment_id.to_string(),
            verifiers: reserved.iter().map(ToString::to_string).collect(),
            verdict: outcome.verdict,
            votes_for: outcome.result.votes_for,
            votes_against: outcome.result.votes_against,
            abstained: outcome.result.abstained,
            slashed: outcome.slashed.iter().map(ToString::to_string).collect(),
        })
    }

    fn fund(&self, actor: &ActorId, amount: u128) {
        self.ledger.mint(actor, amount);
        self.ledger
            .approve(actor, &self.node.accounts().vault, amount);
    }
}

fn actor_keys(role: &[u8], run: u64, index: u8) -> KeyPair {
    let seed = blake2b_256_multi(&[b"attest/sim/", role, &run.to_le_bytes(), &[index]]);
    keypair_from_seed(&seed)
}

fn join_all<E>(
    handles: Vec<std::thread::ScopedJoinHandle<'_, Result<(), E>>>,
) -> Result<(), NodeError>
where
    NodeError: From<E>,
{
    for handle in handles {
        handle
            .join()
            .map_err(|_| NodeError::Simulation("voter thread panicked".into()))??;
    }
    Ok(())
}
