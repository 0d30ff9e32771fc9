//! Audit events appended by every state-changing operation.
//!
//! Events are written to an append-only log for off-core audit and indexing.
//! Each one exposes at least an identifier, the acting principal (when there
//! is one), and a short outcome string.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::ids::{ChallengeId, ChannelId, CommitmentId, ModelId, ProofId, StakeId};
use crate::time::Timestamp;

/// What happened to a stake record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeEventKind {
    Staked,
    Released,
    Slashed,
    /// A share of a slashed amount credited to an honest actor.
    Redistributed,
    /// The part of a slashed amount that was destroyed.
    Burned,
}

impl StakeEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Staked => "staked",
            Self::Released => "released",
            Self::Slashed => "slashed",
            Self::Redistributed => "redistributed",
            Self::Burned => "burned",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditEvent {
    // ── Stake vault ──────────────────────────────────────────────────────
    Stake {
        stake_id: StakeId,
        actor: ActorId,
        amount: u128,
        kind: StakeEventKind,
    },

    // ── Actor registry ───────────────────────────────────────────────────
    ActorRegistered {
        stake_id: StakeId,
        actor: ActorId,
        slots: u32,
        amount_per_slot: u128,
    },
    ActorDeregistered {
        stake_id: StakeId,
        actor: ActorId,
        released: u128,
    },
    SlotsChanged {
        stake_id: StakeId,
        actor: ActorId,
        free_slots: u32,
        max_slots: u32,
    },

    // ── Commit-reveal ────────────────────────────────────────────────────
    CommitmentCreated {
        commitment_id: CommitmentId,
        voters: usize,
        commit_deadline: Timestamp,
        reveal_deadline: Timestamp,
    },
    VoteCommitted {
        commitment_id: CommitmentId,
        voter: ActorId,
    },
    VoteRevealed {
        commitment_id: CommitmentId,
        voter: ActorId,
        vote: bool,
    },
    CommitmentResolved {
        commitment_id: CommitmentId,
        passed: bool,
        losers: usize,
    },

    // ── Gossiper pool ────────────────────────────────────────────────────
    ChannelInitialized {
        channel_id: ChannelId,
        proof_id: ProofId,
        owner: ActorId,
        gossipers: Vec<ActorId>,
    },
    ProofSubmitted {
        channel_id: ChannelId,
        gossiper: ActorId,
    },
    ProofValidated {
        channel_id: ChannelId,
        validated: bool,
        matching: usize,
    },
    ChannelTerminated {
        channel_id: ChannelId,
        owner: ActorId,
        slashed: Vec<ActorId>,
    },

    // ── Verifier pool ────────────────────────────────────────────────────
    ChallengeInitialized {
        challenge_id: ChallengeId,
        model_id: ModelId,
        requester: ActorId,
        verifiers: Vec<ActorId>,
    },
    CommitRevealStarted {
        challenge_id: ChallengeId,
        commitment_id: CommitmentId,
        caller: ActorId,
    },
    ChallengeResolved {
        challenge_id: ChallengeId,
        verified: bool,
        slashed: Vec<ActorId>,
    },
    /// Wall time ran out before the vote started; reservations returned.
    ChallengeExpired {
        challenge_id: ChallengeId,
        released: Vec<ActorId>,
    },
}

impl AuditEvent {
    /// Hex identifier of the record this event is about.
    pub fn identifier(&self) -> String {
        match self {
            Self::Stake { stake_id, .. }
            | Self::ActorRegistered { stake_id, .. }
            | Self::ActorDeregistered { stake_id, .. }
            | Self::SlotsChanged { stake_id, .. } => stake_id.to_string(),
            Self::CommitmentCreated { commitment_id, .. }
            | Self::VoteCommitted { commitment_id, .. }
            | Self::VoteRevealed { commitment_id, .. }
            | Self::CommitmentResolved { commitment_id, .. } => commitment_id.to_string(),
            Self::ChannelInitialized { channel_id, .. }
            | Self::ProofSubmitted { channel_id, .. }
            | Self::ProofValidated { channel_id, .. }
            | Self::ChannelTerminated { channel_id, .. } => channel_id.to_string(),
            Self::ChallengeInitialized { challenge_id, .. }
            | Self::CommitRevealStarted { challenge_id, .. }
            | Self::ChallengeResolved { challenge_id, .. }
            | Self::ChallengeExpired { challenge_id, .. } => challenge_id.to_string(),
        }
    }

    /// The principal that acted or was acted upon, if any.
    pub fn actor(&self) -> Option<&ActorId> {
        match self {
            Self::Stake { actor, .. }
            | Self::ActorRegistered { actor, .. }
            | Self::ActorDeregistered { actor, .. }
            | Self::SlotsChanged { actor, .. } => Some(actor),
            Self::VoteCommitted { voter, .. } | Self::VoteRevealed { voter, .. } => Some(voter),
            Self::ChannelInitialized { owner, .. } | Self::ChannelTerminated { owner, .. } => {
                Some(owner)
            }
            Self::ProofSubmitted { gossiper, .. } => Some(gossiper),
            Self::ChallengeInitialized { requester, .. } => Some(requester),
            Self::CommitRevealStarted { caller, .. } => Some(caller),
            Self::CommitmentCreated { .. }
            | Self::CommitmentResolved { .. }
            | Self::ProofValidated { .. }
            | Self::ChallengeResolved { .. }
            | Self::ChallengeExpired { .. } => None,
        }
    }

    /// Short machine-readable outcome.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::Stake { kind, .. } => kind.as_str(),
            Self::ActorRegistered { .. } => "registered",
            Self::ActorDeregistered { .. } => "deregistered",
            Self::SlotsChanged { .. } => "slots_changed",
            Self::CommitmentCreated { .. } => "commitment_created",
            Self::VoteCommitted { .. } => "committed",
            Self::VoteRevealed { .. } => "revealed",
            Self::CommitmentResolved { passed: true, .. } => "passed",
            Self::CommitmentResolved { passed: false, .. } => "failed",
            Self::ChannelInitialized { .. } => "channel_initialized",
            Self::ProofSubmitted { .. } => "proof_submitted",
            Self::ProofValidated { validated: true, .. } => "validated",
            Self::ProofValidated { validated: false, .. } => "not_validated",
            Self::ChannelTerminated { .. } => "terminated",
            Self::ChallengeInitialized { .. } => "challenge_initialized",
            Self::CommitRevealStarted { .. } => "commit_reveal_started",
            Self::ChallengeResolved { verified: true, .. } => "verified",
            Self::ChallengeResolved { verified: false, .. } => "rejected",
            Self::ChallengeExpired { .. } => "expired",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_event_exposes_identifier_actor_and_outcome() {
        let stake_id = StakeId::from_label("pool");
        let actor = ActorId::new([7; 32]);
        let event = AuditEvent::Stake {
            stake_id,
            actor,
            amount: 100,
            kind: StakeEventKind::Slashed,
        };
        assert_eq!(event.identifier(), stake_id.to_string());
        assert_eq!(event.actor(), Some(&actor));
        assert_eq!(event.outcome(), "slashed");
    }

    #[test]
    fn resolution_outcome_follows_result() {
        let event = AuditEvent::CommitmentResolved {
            commitment_id: CommitmentId::from_label("c"),
            passed: false,
            losers: 1,
        };
        assert_eq!(event.outcome(), "failed");
        assert!(event.actor().is_none());
    }

    #[test]
    fn events_serialize_to_json() {
        let event = AuditEvent::VoteRevealed {
            commitment_id: CommitmentId::from_label("c"),
            voter: ActorId::new([1; 32]),
            vote: true,
        };
        let json = serde_json::to_string(&event).expect("serializable");
        assert!(json.contains("VoteRevealed"));
    }
}
