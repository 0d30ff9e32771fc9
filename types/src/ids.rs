//! 32-byte identifiers used to key stakes, commitments, channels and challenges.
//!
//! Every identifier is an opaque digest. Callers usually derive them by hashing
//! something meaningful (a pool account, a label, a model location); the core
//! only compares them for equality.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::actor::ActorId;

type Blake2b256 = Blake2b<U32>;

fn hash_parts(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $domain:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name([u8; 32]);

        impl $name {
            pub const ZERO: Self = Self([0u8; 32]);

            pub fn new(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }

            /// Derive an identifier by hashing a human-readable label.
            pub fn from_label(label: &str) -> Self {
                Self(hash_parts(&[$domain.as_bytes(), label.as_bytes()]))
            }

            pub fn as_bytes(&self) -> &[u8; 32] {
                &self.0
            }

            pub fn is_zero(&self) -> bool {
                self.0 == [0u8; 32]
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(&self.0[..4]))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", hex::encode(self.0))
            }
        }

        impl From<[u8; 32]> for $name {
            fn from(bytes: [u8; 32]) -> Self {
                Self(bytes)
            }
        }
    };
}

define_id!(
    /// Namespace of a pool's stake records inside the vault.
    StakeId,
    "attest/stake"
);
define_id!(
    /// Identifier of one commit-reveal voting instance.
    CommitmentId,
    "attest/commitment"
);
define_id!(
    /// Identifier of a gossiper-pool proof-of-training session.
    ChannelId,
    "attest/channel"
);
define_id!(
    /// Identifier of a verifier-pool proof-of-correctness session.
    ChallengeId,
    "attest/challenge"
);
define_id!(
    /// Identifier of the model under training/verification.
    ModelId,
    "attest/model"
);
define_id!(
    /// Reference (content address) of an off-core data set.
    DataRef,
    "attest/data"
);
define_id!(
    /// Identifier of the proof a channel aggregates.
    ProofId,
    "attest/proof"
);
define_id!(
    /// Generic 32-byte digest (merkle nodes, result digests, commit hashes).
    Digest,
    "attest/digest"
);

impl StakeId {
    /// The stake namespace owned by a pool account.
    pub fn for_pool(pool: &ActorId) -> Self {
        Self(hash_parts(&[b"attest/stake/pool", pool.as_bytes()]))
    }
}

impl CommitmentId {
    /// The commitment that runs the vote for a verifier-pool challenge.
    pub fn for_challenge(challenge: &ChallengeId) -> Self {
        Self(hash_parts(&[b"attest/commitment/challenge", challenge.as_bytes()]))
    }
}

impl ProofId {
    /// The proof identifier a channel publishes when it is opened.
    pub fn for_channel(channel: &ChannelId, owner: &ActorId) -> Self {
        Self(hash_parts(&[
            b"attest/proof/channel",
            channel.as_bytes(),
            owner.as_bytes(),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_label_is_deterministic() {
        assert_eq!(ChannelId::from_label("a"), ChannelId::from_label("a"));
        assert_ne!(ChannelId::from_label("a"), ChannelId::from_label("b"));
    }

    #[test]
    fn domains_separate_identical_labels() {
        let c = ChannelId::from_label("same");
        let h = ChallengeId::from_label("same");
        assert_ne!(c.as_bytes(), h.as_bytes());
    }

    #[test]
    fn pool_stake_ids_differ_per_pool() {
        let a = StakeId::for_pool(&ActorId::new([1; 32]));
        let b = StakeId::for_pool(&ActorId::new([2; 32]));
        assert_ne!(a, b);
    }

    #[test]
    fn display_is_full_hex() {
        let id = Digest::new([0xab; 32]);
        assert_eq!(id.to_string().len(), 64);
        assert!(id.to_string().starts_with("abab"));
    }
}
