use std::sync::Arc;

use proptest::prelude::*;

use attest_nullables::MemoryLedger;
use attest_stake::{SlashMode, StakeVault, TokenLedger};
use attest_store::NullEventLog;
use attest_types::{ActorId, StakeId};

const VAULT: ActorId = ActorId::new([0xAA; 32]);
const OPERATOR: ActorId = ActorId::new([0xBB; 32]);
const FUNDING: u128 = 1_000;

#[derive(Clone, Debug)]
enum Op {
    Stake { actor: u8, amount: u128 },
    Release { actor: u8, amount: u128 },
    Burn { actor: u8, amount: u128 },
    Redistribute { actor: u8, amount: u128 },
}

fn op() -> impl Strategy<Value = Op> {
    let actor = 1u8..=4;
    let amount = 1u128..=300;
    prop_oneof![
        (actor.clone(), amount.clone()).prop_map(|(actor, amount)| Op::Stake { actor, amount }),
        (actor.clone(), amount.clone()).prop_map(|(actor, amount)| Op::Release { actor, amount }),
        (actor.clone(), amount.clone()).prop_map(|(actor, amount)| Op::Burn { actor, amount }),
        (actor, amount).prop_map(|(actor, amount)| Op::Redistribute { actor, amount }),
    ]
}

fn who(n: u8) -> ActorId {
    ActorId::new([n; 32])
}

proptest! {
    /// Whatever sequence of operations runs, and whichever of them fail,
    /// custody on the ledger equals the sum of the stake records and no
    /// token is created.
    #[test]
    fn custody_matches_records(ops in prop::collection::vec(op(), 1..60)) {
        let ledger = Arc::new(MemoryLedger::new());
        let vault = StakeVault::new(ledger.clone(), VAULT, Arc::new(NullEventLog));
        vault.authorize(OPERATOR);
        let pool = StakeId::from_label("pool");
        for n in 1..=4 {
            ledger.mint(&who(n), FUNDING);
            ledger.approve(&who(n), &VAULT, u128::MAX);
        }
        let cohort: Vec<ActorId> = (1..=4).map(who).collect();

        for op in ops {
            let _ = match op {
                Op::Stake { actor, amount } => vault.stake(pool, who(actor), amount),
                Op::Release { actor, amount } => vault.release(&OPERATOR, pool, who(actor), amount),
                Op::Burn { actor, amount } => vault
                    .slash(&OPERATOR, pool, who(actor), amount, &SlashMode::Burn)
                    .map(|_| ()),
                Op::Redistribute { actor, amount } => vault
                    .slash(&OPERATOR, pool, who(actor), amount, &SlashMode::Redistribute(cohort.clone()))
                    .map(|_| ()),
            };

            let records: u128 = (1..=4).map(|n| vault.stake_of(&pool, &who(n))).sum();
            prop_assert_eq!(vault.total_staked(&pool), records);
            prop_assert_eq!(ledger.balance_of(&VAULT), records);
            let wallets: u128 = (1..=4).map(|n| ledger.balance_of(&who(n))).sum();
            prop_assert_eq!(wallets + records, ledger.total_supply());
            prop_assert!(ledger.total_supply() <= 4 * FUNDING);
        }
    }
}
