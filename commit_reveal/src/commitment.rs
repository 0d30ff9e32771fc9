//! Commitment records and the majority tally.

use std::collections::BTreeMap;

use attest_types::{ActorId, CommitmentId, Digest, Timestamp};
use serde::{Deserialize, Serialize};

/// The hash a voter commits to: `Blake2b-256(vote_byte || value)`.
pub fn commit_hash(vote: bool, value: &[u8]) -> Digest {
    attest_crypto::digest_of(&[&[vote as u8], value])
}

/// Where a commitment is in its lifecycle at a given time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Accepting commits.
    Open,
    /// Commit window closed; accepting reveals until the reveal deadline.
    Revealing,
    /// Reveal window closed, result not yet computed.
    Closed,
    Resolved,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Passed,
    Failed,
}

/// A disclosed vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reveal {
    pub vote: bool,
    pub value: Vec<u8>,
}

/// The tally of a resolved commitment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitmentResult {
    pub outcome: Outcome,
    pub votes_for: usize,
    pub votes_against: usize,
    pub abstained: usize,
    /// Abstainers plus revealers of the minority vote, in voter order.
    pub losers: Vec<ActorId>,
}

impl CommitmentResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Tally the reveals of a fixed voter set.
///
/// Passes iff `votes_for > voters.len() / 2`. The denominator is the full
/// voter set, so an abstention weighs the same as a vote against.
///
/// Losers are every abstainer plus every revealer on the smaller side of
/// the revealed votes. A tie among revealers makes only the abstainers
/// losers.
pub fn tally(voters: &[ActorId], reveals: &BTreeMap<ActorId, Reveal>) -> CommitmentResult {
    let votes_for = voters
        .iter()
        .filter(|v| reveals.get(*v).is_some_and(|r| r.vote))
        .count();
    let votes_against = voters
        .iter()
        .filter(|v| reveals.get(*v).is_some_and(|r| !r.vote))
        .count();
    let abstained = voters.len() - votes_for - votes_against;

    let minority = match votes_for.cmp(&votes_against) {
        std::cmp::Ordering::Greater => Some(false),
        std::cmp::Ordering::Less => Some(true),
        std::cmp::Ordering::Equal => None,
    };
    let losers = voters
        .iter()
        .filter(|v| match reveals.get(*v) {
            None => true,
            Some(reveal) => Some(reveal.vote) == minority,
        })
        .copied()
        .collect();

    let outcome = if votes_for * 2 > voters.len() {
        Outcome::Passed
    } else {
        Outcome::Failed
    };

    CommitmentResult {
        outcome,
        votes_for,
        votes_against,
        abstained,
        losers,
    }
}

/// One commit-reveal vote.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commitment {
    pub id: CommitmentId,
    /// Ordered, unique. Fixed at setup.
    pub voters: Vec<ActorId>,
    pub created_at: Timestamp,
    pub commit_deadline: Timestamp,
    pub reveal_deadline: Timestamp,
    pub commits: BTreeMap<ActorId, Digest>,
    pub reveals: BTreeMap<ActorId, Reveal>,
    pub result: Option<CommitmentResult>,
}

impl Commitment {
    pub fn is_voter(&self, actor: &ActorId) -> bool {
        self.voters.contains(actor)
    }

    pub fn phase(&self, now: Timestamp) -> Phase {
        if self.result.is_some() {
            Phase::Resolved
        } else if now < self.commit_deadline {
            Phase::Open
        } else if now < self.reveal_deadline {
            Phase::Revealing
        } else {
            Phase::Closed
        }
    }

    pub fn can_reveal(&self, now: Timestamp) -> bool {
        self.commit_deadline <= now && now < self.reveal_deadline
    }

    pub fn is_timed_out(&self, now: Timestamp) -> bool {
        now >= self.reveal_deadline
    }

    pub fn all_revealed(&self) -> bool {
        self.reveals.len() == self.voters.len()
    }

    /// Voters that committed but have not revealed.
    pub fn pending_reveals(&self) -> Vec<ActorId> {
        self.commits
            .keys()
            .filter(|v| !self.reveals.contains_key(*v))
            .copied()
            .collect()
    }
}
