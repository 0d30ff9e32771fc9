use std::collections::BTreeMap;

use attest_types::{ActorId, ChannelId, Digest, ProofId, Signature, Timestamp};
use serde::{Deserialize, Serialize};

/// The part of a proof that gossipers must agree on: everything they sign
/// except the channel id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProofKey {
    pub merkle_root: Vec<Digest>,
    pub end_of_training: String,
    pub result_digest: Digest,
}

/// A proof of training as submitted by one gossiper.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedProof {
    pub end_of_training: String,
    pub merkle_root: Vec<Digest>,
    pub result_digest: Digest,
    pub signature: Signature,
}

impl SignedProof {
    pub fn key(&self) -> ProofKey {
        ProofKey {
            merkle_root: self.merkle_root.clone(),
            end_of_training: self.end_of_training.clone(),
            result_digest: self.result_digest,
        }
    }
}

/// A gossiper-pool session for one training run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub proof_id: ProofId,
    pub required_k: usize,
    pub threshold_m: usize,
    pub owner: ActorId,
    /// Gossipers holding one reserved slot for this channel.
    pub reserved: Vec<ActorId>,
    pub proofs: BTreeMap<ActorId, SignedProof>,
    pub validated: bool,
    /// The proof content that reached the threshold.
    pub agreed: Option<ProofKey>,
    pub terminated: bool,
    pub created_at: Timestamp,
}

impl Channel {
    pub fn is_reserved(&self, actor: &ActorId) -> bool {
        self.reserved.contains(actor)
    }

    /// The most common proof content and how many gossipers submitted it.
    ///
    /// The key is `None` when no proof has arrived or when two contents
    /// share the top count; a tie has no leader until another proof breaks
    /// it.
    pub fn leading_proof(&self) -> (Option<ProofKey>, usize) {
        let mut counts: BTreeMap<ProofKey, usize> = BTreeMap::new();
        for proof in self.proofs.values() {
            *counts.entry(proof.key()).or_insert(0) += 1;
        }
        let top = counts.values().copied().max().unwrap_or(0);
        let mut leaders = counts.into_iter().filter(|(_, count)| *count == top);
        match (leaders.next(), leaders.next()) {
            (Some((key, _)), None) => (Some(key), top),
            _ => (None, top),
        }
    }

    /// Reserved gossipers whose proof matches the agreed content.
    pub fn agreeing(&self) -> Vec<ActorId> {
        let Some(agreed) = &self.agreed else {
            return Vec::new();
        };
        self.reserved
            .iter()
            .filter(|g| self.proofs.get(*g).is_some_and(|p| p.key() == *agreed))
            .copied()
            .collect()
    }

    /// Reserved gossipers that never submitted or submitted something else.
    pub fn dissenting(&self) -> Vec<ActorId> {
        let agreeing = self.agreeing();
        self.reserved
            .iter()
            .filter(|g| !agreeing.contains(g))
            .copied()
            .collect()
    }
}
