//! The commit-reveal state machine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use attest_store::{EventLog, InsertError, KeyedStore};
use attest_types::{ActorId, AuditEvent, CommitmentId, Digest, Timestamp};

use crate::commitment::{commit_hash, tally, Commitment, CommitmentResult, Reveal};
use crate::error::CommitRevealError;

/// Runs any number of independent commitments.
///
/// Calls on one commitment are serialized by that commitment's lock; calls
/// on different commitments run in parallel. Commitments are never deleted.
pub struct CommitRevealEngine {
    commitments: KeyedStore<CommitmentId, Commitment>,
    events: Arc<dyn EventLog>,
}

impl CommitRevealEngine {
    pub fn new(events: Arc<dyn EventLog>) -> Self {
        Self {
            commitments: KeyedStore::new(),
            events,
        }
    }

    /// Create a commitment for `voters` with windows starting at `now`.
    ///
    /// The commit window closes at `now + commit_duration`; the reveal
    /// window closes `reveal_duration` seconds after that.
    pub fn setup(
        &self,
        id: CommitmentId,
        commit_duration: u64,
        reveal_duration: u64,
        voters: &[ActorId],
        now: Timestamp,
    ) -> Result<(), CommitRevealError> {
        if commit_duration == 0 || reveal_duration == 0 {
            return Err(CommitRevealError::InvalidWindow);
        }
        let unique: BTreeSet<_> = voters.iter().collect();
        if voters.is_empty() || unique.len() != voters.len() {
            return Err(CommitRevealError::InvalidVoterSet);
        }

        let commit_deadline = now.plus_secs(commit_duration);
        let reveal_deadline = commit_deadline.plus_secs(reveal_duration);
        self.commitments
            .insert_with(id, || {
                Ok::<_, CommitRevealError>(Commitment {
                    id,
                    voters: voters.to_vec(),
                    created_at: now,
                    commit_deadline,
                    reveal_deadline,
                    commits: BTreeMap::new(),
                    reveals: BTreeMap::new(),
                    result: None,
                })
            })
            .map_err(|e| match e {
                InsertError::Duplicate => CommitRevealError::DuplicateIdentifier(id),
                InsertError::Init(e) => e,
            })?;

        tracing::info!(
            commitment = %id,
            voters = voters.len(),
            commit_deadline = %commit_deadline,
            reveal_deadline = %reveal_deadline,
            "commitment created"
        );
        self.events.append(AuditEvent::CommitmentCreated {
            commitment_id: id,
            voters: voters.len(),
            commit_deadline,
            reveal_deadline,
        });
        Ok(())
    }

    /// Record `voter`'s commit hash. Each voter commits once, before the
    /// commit deadline.
    pub fn commit(
        &self,
        id: CommitmentId,
        voter: ActorId,
        hash: Digest,
        now: Timestamp,
    ) -> Result<(), CommitRevealError> {
        self.with_commitment(id, |c| {
            if !c.is_voter(&voter) {
                return Err(CommitRevealError::NotAVoter(voter));
            }
            if c.commits.contains_key(&voter) {
                return Err(CommitRevealError::AlreadyCommitted(voter));
            }
            if now >= c.commit_deadline {
                return Err(CommitRevealError::CommitWindowClosed {
                    deadline: c.commit_deadline,
                });
            }
            c.commits.insert(voter, hash);
            Ok(())
        })?;

        tracing::debug!(commitment = %id, voter = %voter, "vote committed");
        self.events.append(AuditEvent::VoteCommitted {
            commitment_id: id,
            voter,
        });
        Ok(())
    }

    /// Disclose `voter`'s vote. Accepted only inside the reveal window and
    /// only when `commit_hash(vote, value)` equals the stored commit.
    pub fn reveal(
        &self,
        id: CommitmentId,
        voter: ActorId,
        value: &[u8],
        vote: bool,
        now: Timestamp,
    ) -> Result<(), CommitRevealError> {
        self.with_commitment(id, |c| {
            if !c.is_voter(&voter) {
                return Err(CommitRevealError::NotAVoter(voter));
            }
            if now < c.commit_deadline {
                return Err(CommitRevealError::RevealWindowNotOpen {
                    opens: c.commit_deadline,
                });
            }
            if now >= c.reveal_deadline {
                return Err(CommitRevealError::RevealWindowClosed {
                    deadline: c.reveal_deadline,
                });
            }
            let Some(committed) = c.commits.get(&voter) else {
                return Err(CommitRevealError::NotCommitted(voter));
            };
            if c.reveals.contains_key(&voter) {
                return Err(CommitRevealError::AlreadyRevealed(voter));
            }
            if commit_hash(vote, value) != *committed {
                return Err(CommitRevealError::InvalidPreimage(voter));
            }
            c.reveals.insert(
                voter,
                Reveal {
                    vote,
                    value: value.to_vec(),
                },
            );
            Ok(())
        })?;

        tracing::debug!(commitment = %id, voter = %voter, vote, "vote revealed");
        self.events.append(AuditEvent::VoteRevealed {
            commitment_id: id,
            voter,
            vote,
        });
        Ok(())
    }

    /// Whether the reveal window is open at `now`.
    pub fn can_reveal(&self, id: &CommitmentId, now: Timestamp) -> Result<bool, CommitRevealError> {
        self.read(id, |c| c.can_reveal(now))
    }

    /// Whether the reveal window has closed at `now`.
    pub fn is_commitment_timedout(
        &self,
        id: &CommitmentId,
        now: Timestamp,
    ) -> Result<bool, CommitRevealError> {
        self.read(id, |c| c.is_timed_out(now))
    }

    /// Resolve the commitment, or return the stored result if it already is.
    ///
    /// Available once the reveal window has closed or every voter has
    /// revealed. The voter set is the one fixed at setup.
    pub fn get_commitment_result(
        &self,
        id: CommitmentId,
        now: Timestamp,
    ) -> Result<CommitmentResult, CommitRevealError> {
        let (result, fresh) = self.with_commitment(id, |c| {
            if let Some(result) = &c.result {
                return Ok((result.clone(), false));
            }
            if !c.is_timed_out(now) && !c.all_revealed() {
                return Err(CommitRevealError::ChallengeNotReady {
                    revealed: c.reveals.len(),
                    voters: c.voters.len(),
                    deadline: c.reveal_deadline,
                });
            }
            let result = tally(&c.voters, &c.reveals);
            c.result = Some(result.clone());
            Ok((result, true))
        })?;

        if fresh {
            tracing::info!(
                commitment = %id,
                passed = result.passed(),
                votes_for = result.votes_for,
                votes_against = result.votes_against,
                abstained = result.abstained,
                losers = result.losers.len(),
                "commitment resolved"
            );
            self.events.append(AuditEvent::CommitmentResolved {
                commitment_id: id,
                passed: result.passed(),
                losers: result.losers.len(),
            });
        }
        Ok(result)
    }

    /// A copy of the commitment as it stands now.
    pub fn commitment(&self, id: &CommitmentId) -> Option<Commitment> {
        self.commitments.snapshot(id)
    }

    pub fn exists(&self, id: &CommitmentId) -> bool {
        self.commitments.contains(id)
    }

    pub fn len(&self) -> usize {
        self.commitments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commitments.is_empty()
    }

    fn with_commitment<R>(
        &self,
        id: CommitmentId,
        f: impl FnOnce(&mut Commitment) -> Result<R, CommitRevealError>,
    ) -> Result<R, CommitRevealError> {
        self.commitments
            .with(&id, f)
            .unwrap_or(Err(CommitRevealError::NotFound(id)))
    }

    fn read<R>(
        &self,
        id: &CommitmentId,
        f: impl FnOnce(&Commitment) -> R,
    ) -> Result<R, CommitRevealError> {
        self.commitments
            .with(id, |c| f(&*c))
            .ok_or(CommitRevealError::NotFound(*id))
    }
}
