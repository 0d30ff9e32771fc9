use std::sync::Arc;

use proptest::prelude::*;

use attest_nullables::MemoryLedger;
use attest_registry::ActorRegistry;
use attest_stake::{SlashMode, StakeVault, TokenLedger};
use attest_store::NullEventLog;
use attest_types::{ActorId, StakeId, Timestamp};

const VAULT: ActorId = ActorId::new([0xA0; 32]);
const REGISTRY: ActorId = ActorId::new([0xB0; 32]);
const POOL: ActorId = ActorId::new([0xC0; 32]);
const ACTOR: ActorId = ActorId::new([0x01; 32]);
const PER_SLOT: u128 = 10;

#[derive(Clone, Debug)]
enum Op {
    Reserve,
    Release,
    Slash(u128),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Reserve),
        Just(Op::Release),
        (1u128..=25).prop_map(Op::Slash),
    ]
}

fn registry_with_actor(slots: u32) -> ActorRegistry {
    let ledger = Arc::new(MemoryLedger::new());
    let events = Arc::new(NullEventLog);
    let vault = Arc::new(StakeVault::new(ledger.clone(), VAULT, events.clone()));
    vault.authorize(REGISTRY);
    let registry = ActorRegistry::new(vault, REGISTRY, events);
    registry.authorize(POOL);

    let stake = PER_SLOT * slots as u128;
    ledger.mint(&ACTOR, stake);
    ledger.approve(&ACTOR, &VAULT, stake);
    registry
        .register(&ACTOR, ACTOR, slots, StakeId::for_pool(&POOL), PER_SLOT, Timestamp::new(0))
        .unwrap();
    registry
}

proptest! {
    /// Slot counts stay within bounds under any mix of reservations,
    /// returns and slashes, and deregistration is refused exactly while a
    /// slot is out.
    #[test]
    fn slot_bounds_hold(slots in 1u32..6, ops in prop::collection::vec(op(), 0..40)) {
        let registry = registry_with_actor(slots);
        let stake_id = StakeId::for_pool(&POOL);

        for op in ops {
            // Errors are part of the exercise; the invariants must hold either way.
            let _ = match op {
                Op::Reserve => registry.decrement_actor_slots(&POOL, stake_id, ACTOR).map(|_| ()),
                Op::Release => registry.increment_actor_slots(&POOL, stake_id, ACTOR).map(|_| ()),
                Op::Slash(amount) => registry
                    .slash_actor(&POOL, stake_id, ACTOR, amount, true, &SlashMode::Burn)
                    .map(|_| ()),
            };

            let record = registry.actor(stake_id, &ACTOR).unwrap();
            prop_assert!(record.free_slots <= record.max_slots);
            prop_assert!(record.max_slots <= slots);
            prop_assert!(record.pending_slot_reduction <= record.max_slots - record.free_slots);
            prop_assert_eq!(
                record.staked_amount,
                registry.vault().stake_of(&stake_id, &ACTOR)
            );
        }

        let record = registry.actor(stake_id, &ACTOR).unwrap();
        let deregistered = registry.deregister(&ACTOR, ACTOR, stake_id);
        prop_assert_eq!(deregistered.is_ok(), record.free_slots == record.max_slots);
    }

    /// Returning every reservation brings free slots back to capacity.
    #[test]
    fn reservations_are_conserved(slots in 1u32..6, taken in 0u32..6) {
        let registry = registry_with_actor(slots);
        let stake_id = StakeId::for_pool(&POOL);
        let taken = taken.min(slots);

        for _ in 0..taken {
            registry.decrement_actor_slots(&POOL, stake_id, ACTOR).unwrap();
        }
        let record = registry.actor(stake_id, &ACTOR).unwrap();
        prop_assert_eq!(record.free_slots + taken, record.max_slots);

        for _ in 0..taken {
            registry.increment_actor_slots(&POOL, stake_id, ACTOR).unwrap();
        }
        let record = registry.actor(stake_id, &ACTOR).unwrap();
        prop_assert_eq!(record.free_slots, slots);
    }
}
