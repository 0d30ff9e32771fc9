//! Deterministic actor selection.

use attest_types::ActorId;

/// Picks actors for a duty from the eligible set.
pub struct ActorSelector;

impl ActorSelector {
    /// Select `count` actors ranked by `Blake2b(seed || actor)`.
    ///
    /// The selection is deterministic given the same seed and eligible set,
    /// so anyone can recompute which actors a channel or challenge should
    /// have drawn. Returns fewer than `count` actors only when fewer are
    /// eligible.
    pub fn select(&self, eligible: &[ActorId], seed: &[u8], count: usize) -> Vec<ActorId> {
        if eligible.is_empty() || count == 0 {
            return Vec::new();
        }

        let mut scored: Vec<([u8; 32], ActorId)> = eligible
            .iter()
            .map(|actor| {
                let score = attest_crypto::blake2b_256_multi(&[seed, actor.as_bytes()]);
                (score, *actor)
            })
            .collect();

        scored.sort();
        scored.truncate(count);
        scored.into_iter().map(|(_, actor)| actor).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: u8) -> Vec<ActorId> {
        (0..n).map(|i| ActorId::new([i; 32])).collect()
    }

    #[test]
    fn selection_is_deterministic() {
        let eligible = pool(10);
        let r1 = ActorSelector.select(&eligible, b"channel-1", 3);
        let r2 = ActorSelector.select(&eligible, b"channel-1", 3);
        assert_eq!(r1, r2, "same seed + same pool must produce same selection");
    }

    #[test]
    fn selection_ignores_input_order() {
        let eligible = pool(10);
        let mut reversed = eligible.clone();
        reversed.reverse();
        assert_eq!(
            ActorSelector.select(&eligible, b"seed", 4),
            ActorSelector.select(&reversed, b"seed", 4)
        );
    }

    #[test]
    fn selection_respects_count() {
        assert_eq!(ActorSelector.select(&pool(20), b"seed", 5).len(), 5);
    }

    #[test]
    fn count_larger_than_pool_returns_all() {
        assert_eq!(ActorSelector.select(&pool(3), b"seed", 10).len(), 3);
    }

    #[test]
    fn empty_pool_or_zero_count_returns_empty() {
        assert!(ActorSelector.select(&[], b"seed", 5).is_empty());
        assert!(ActorSelector.select(&pool(1), b"seed", 0).is_empty());
    }

    #[test]
    fn different_seeds_produce_different_selections() {
        let eligible = pool(50);
        assert_ne!(
            ActorSelector.select(&eligible, b"seed-a", 5),
            ActorSelector.select(&eligible, b"seed-b", 5),
            "different seeds should generally produce different selections"
        );
    }
}
