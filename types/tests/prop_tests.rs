use proptest::prelude::*;

use attest_types::{ActorId, ChannelId, CommitmentId, Digest, StakeId, Timestamp};

proptest! {
    /// Digest roundtrip: new -> as_bytes produces the same bytes.
    #[test]
    fn digest_roundtrip(bytes in prop::array::uniform32(0u8..)) {
        let digest = Digest::new(bytes);
        prop_assert_eq!(digest.as_bytes(), &bytes);
    }

    /// is_zero is true only for all-zero bytes.
    #[test]
    fn channel_id_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let id = ChannelId::new(bytes);
        prop_assert_eq!(id.is_zero(), bytes == [0u8; 32]);
    }

    /// Pool stake namespaces never collide for distinct pool accounts.
    #[test]
    fn stake_namespace_injective(a in prop::array::uniform32(0u8..), b in prop::array::uniform32(0u8..)) {
        prop_assume!(a != b);
        prop_assert_ne!(StakeId::for_pool(&ActorId::new(a)), StakeId::for_pool(&ActorId::new(b)));
    }

    /// Actor display always carries the prefix and the full key.
    #[test]
    fn actor_display_format(bytes in prop::array::uniform32(0u8..)) {
        let shown = ActorId::new(bytes).to_string();
        prop_assert!(shown.starts_with(ActorId::PREFIX));
        prop_assert_eq!(shown.len(), ActorId::PREFIX.len() + 64);
    }

    /// Timestamp ordering agrees with the underlying seconds.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        prop_assert_eq!(Timestamp::new(a) < Timestamp::new(b), a < b);
    }

    /// plus_secs never wraps around.
    #[test]
    fn plus_secs_monotonic(base in 0u64..u64::MAX, delta in 0u64..u64::MAX) {
        prop_assert!(Timestamp::new(base).plus_secs(delta) >= Timestamp::new(base));
    }

    /// Commitment ids derived from labels are stable.
    #[test]
    fn commitment_label_stable(label in "[a-z]{1,16}") {
        prop_assert_eq!(CommitmentId::from_label(&label), CommitmentId::from_label(&label));
    }
}
