use attest_commit_reveal::CommitmentResult;
use attest_types::{ActorId, ChallengeId, CommitmentId, DataRef, ModelId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Verified,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeState {
    /// Verifiers reserved, vote not started.
    Created,
    CommitRevealActive,
    Resolved(Verdict),
    /// Wall time ran out before the vote started; reservations returned.
    Expired,
}

/// The stored resolution of a challenge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeOutcome {
    pub verdict: Verdict,
    pub result: CommitmentResult,
    pub slashed: Vec<ActorId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: ChallengeId,
    pub model_id: ModelId,
    pub requester: ActorId,
    pub wall_deadline: Timestamp,
    pub k_verifiers: usize,
    pub testing_data: DataRef,
    pub reserved: Vec<ActorId>,
    pub commitment_id: Option<CommitmentId>,
    pub state: ChallengeState,
    pub outcome: Option<ChallengeOutcome>,
    pub created_at: Timestamp,
}

impl Challenge {
    pub fn is_reserved(&self, actor: &ActorId) -> bool {
        self.reserved.contains(actor)
    }

    pub fn is_verified(&self) -> bool {
        self.state == ChallengeState::Resolved(Verdict::Verified)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.state, ChallengeState::Resolved(_))
    }
}
