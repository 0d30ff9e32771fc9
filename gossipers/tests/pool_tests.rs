//! Gossiper pool behaviour against a real registry, vault and ledger.

use std::sync::Arc;

use attest_crypto::{keypair_from_seed, sign_message};
use attest_gossipers::{
    proof_message, Ed25519ProofVerifier, GossiperError, GossiperPool, GossiperPoolConfig,
    ProofVerifier,
};
use attest_nullables::{MemoryLedger, NullProofVerifier};
use attest_registry::{ActorRegistry, RegistryError};
use attest_stake::{StakeVault, TokenLedger};
use attest_store::MemoryEventLog;
use attest_types::{ActorId, ChannelId, Digest, KeyPair, ProofId, Signature, Timestamp};

const VAULT: ActorId = ActorId::new([0xA0; 32]);
const REGISTRY: ActorId = ActorId::new([0xB0; 32]);
const POOL: ActorId = ActorId::new([0xC0; 32]);
const OWNER: ActorId = ActorId::new([0xD0; 32]);
const AMOUNT: u128 = 100;

struct Fixture {
    ledger: Arc<MemoryLedger>,
    events: Arc<MemoryEventLog>,
    registry: Arc<ActorRegistry>,
    pool: GossiperPool,
    gossipers: Vec<KeyPair>,
}

fn fixture_with(verifier: Arc<dyn ProofVerifier>, count: u8, slots: u32) -> Fixture {
    build(verifier, count, slots, true)
}

/// `vault_trusts_registry = false` leaves the registry unable to release or
/// slash stake until the test authorizes it.
fn build(
    verifier: Arc<dyn ProofVerifier>,
    count: u8,
    slots: u32,
    vault_trusts_registry: bool,
) -> Fixture {
    let ledger = Arc::new(MemoryLedger::new());
    let events = Arc::new(MemoryEventLog::new());
    let vault = Arc::new(StakeVault::new(ledger.clone(), VAULT, events.clone()));
    if vault_trusts_registry {
        vault.authorize(REGISTRY);
    }
    let registry = Arc::new(ActorRegistry::new(vault, REGISTRY, events.clone()));
    registry.authorize(POOL);
    let pool = GossiperPool::new(
        POOL,
        GossiperPoolConfig::default(),
        registry.clone(),
        verifier,
        events.clone(),
    );
    pool.authorize_requester(OWNER);

    let gossipers: Vec<KeyPair> = (1..=count).map(|i| keypair_from_seed(&[i; 32])).collect();
    for kp in &gossipers {
        let id = kp.actor_id();
        let stake = AMOUNT * slots as u128;
        // One token more than needed, as a funded wallet would hold.
        ledger.mint(&id, stake + 1);
        ledger.approve(&id, &VAULT, stake);
        pool.register_gossiper(id, AMOUNT, slots, Timestamp::new(1)).unwrap();
    }
    Fixture {
        ledger,
        events,
        registry,
        pool,
        gossipers,
    }
}

fn fixture() -> Fixture {
    fixture_with(Arc::new(Ed25519ProofVerifier), 3, 1)
}

fn channel() -> ChannelId {
    ChannelId::from_label("MyGossiperChannel")
}

fn merkle_root() -> Vec<Digest> {
    ["trx1", "trx2", "trx3"].into_iter().map(Digest::from_label).collect()
}

const EOT: &str = "end of training";

fn submit(f: &Fixture, kp: &KeyPair, result: &str) -> Result<(), GossiperError> {
    let result = Digest::from_label(result);
    let message = proof_message(&channel(), &merkle_root(), EOT, &result);
    let signature = sign_message(message.as_bytes(), &kp.private);
    f.pool
        .submit_proof(kp.actor_id(), channel(), EOT, merkle_root(), signature, result)
}

fn free_slots(f: &Fixture, kp: &KeyPair) -> u32 {
    f.registry
        .actor(f.pool.stake_id(), &kp.actor_id())
        .unwrap()
        .free_slots
}

// ── End-to-end ──────────────────────────────────────────────────────────

#[test]
fn three_gossipers_validate_and_terminate() {
    let f = fixture();
    assert_eq!(f.pool.get_available_gossipers().len(), 3);

    let proof_id = f
        .pool
        .init_channel(&OWNER, channel(), 3, 3, OWNER, Timestamp::new(10))
        .unwrap();
    assert_eq!(proof_id, ProofId::for_channel(&channel(), &OWNER));
    assert_eq!(f.pool.get_proof_id_by_channel_id(&channel()), Some(proof_id));
    assert!(f.pool.get_available_gossipers().is_empty());
    for kp in &f.gossipers {
        assert_eq!(free_slots(&f, kp), 0);
    }

    for kp in &f.gossipers {
        submit(&f, kp, "results").unwrap();
    }
    assert!(f.pool.validate_proof(channel()).unwrap());
    assert!(f.pool.is_valid_proof(&channel()));

    let slashed = f.pool.terminate_channel(&OWNER, channel()).unwrap();
    assert!(slashed.is_empty());
    assert!(f.pool.is_channel_terminated(&channel()));
    for kp in &f.gossipers {
        assert_eq!(free_slots(&f, kp), 1);
    }

    for kp in &f.gossipers {
        assert_eq!(f.pool.deregister_gossiper(kp.actor_id()).unwrap(), AMOUNT);
        assert!(!f.pool.is_registered_gossiper(&kp.actor_id()));
        assert_eq!(f.ledger.balance_of(&kp.actor_id()), AMOUNT + 1);
    }
    assert!(f.pool.get_available_gossipers().is_empty());
}

#[test]
fn reserved_gossiper_cannot_deregister() {
    let f = fixture();
    f.pool
        .init_channel(&OWNER, channel(), 3, 3, OWNER, Timestamp::new(10))
        .unwrap();
    let err = f
        .pool
        .deregister_gossiper(f.gossipers[0].actor_id())
        .unwrap_err();
    assert!(matches!(
        err,
        GossiperError::Registry(RegistryError::SlotsInUse { .. })
    ));
    assert!(f.pool.is_registered_gossiper(&f.gossipers[0].actor_id()));
}

// ── Channel setup ───────────────────────────────────────────────────────

#[test]
fn init_channel_validates_parameters() {
    let f = fixture();
    for (k, m) in [(1, 1), (3, 0), (3, 4)] {
        let err = f
            .pool
            .init_channel(&OWNER, channel(), k, m, OWNER, Timestamp::new(10))
            .unwrap_err();
        assert!(matches!(err, GossiperError::InvalidThreshold { .. }), "k={k} m={m}");
    }
    assert_eq!(f.pool.channel_count(), 0);
}

#[test]
fn init_channel_requires_authorized_requester() {
    let f = fixture();
    let stranger = ActorId::new([0xEE; 32]);
    assert_eq!(
        f.pool
            .init_channel(&stranger, channel(), 3, 3, stranger, Timestamp::new(10))
            .unwrap_err(),
        GossiperError::Unauthorized(stranger)
    );
}

#[test]
fn insufficient_gossipers_reserves_nothing() {
    let f = fixture();
    let err = f
        .pool
        .init_channel(&OWNER, channel(), 4, 3, OWNER, Timestamp::new(10))
        .unwrap_err();
    assert_eq!(
        err,
        GossiperError::InsufficientGossipers {
            needed: 4,
            available: 3
        }
    );
    assert_eq!(f.pool.get_available_gossipers().len(), 3);
    assert!(f.pool.channel(&channel()).is_none());
}

#[test]
fn channel_ids_are_unique() {
    let f = fixture_with(Arc::new(Ed25519ProofVerifier), 3, 2);
    f.pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();
    let err = f
        .pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(11))
        .unwrap_err();
    assert_eq!(err, GossiperError::AlreadyExists(channel()));
    // The rejected call reserved nothing.
    for kp in &f.gossipers {
        assert_eq!(free_slots(&f, kp), 1);
    }
}

#[test]
fn slots_are_conserved_across_channels() {
    let f = fixture_with(Arc::new(Ed25519ProofVerifier), 3, 2);
    f.pool
        .init_channel(&OWNER, channel(), 2, 2, OWNER, Timestamp::new(10))
        .unwrap();
    f.pool
        .init_channel(&OWNER, ChannelId::from_label("second"), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();

    let total_reserved: u32 = f
        .gossipers
        .iter()
        .map(|kp| {
            let record = f.registry.actor(f.pool.stake_id(), &kp.actor_id()).unwrap();
            record.max_slots - record.free_slots
        })
        .sum();
    assert_eq!(total_reserved, 5);
}

// ── Proof submission ────────────────────────────────────────────────────

#[test]
fn submission_is_restricted_to_reserved_gossipers() {
    let f = fixture_with(Arc::new(Ed25519ProofVerifier), 4, 1);
    f.pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();
    let reserved = f.pool.channel(&channel()).unwrap().reserved;
    let outsider = f
        .gossipers
        .iter()
        .find(|kp| !reserved.contains(&kp.actor_id()))
        .unwrap();

    assert_eq!(
        submit(&f, outsider, "results").unwrap_err(),
        GossiperError::Unauthorized(outsider.actor_id())
    );
}

#[test]
fn duplicate_and_forged_submissions_are_rejected() {
    let f = fixture();
    f.pool
        .init_channel(&OWNER, channel(), 3, 3, OWNER, Timestamp::new(10))
        .unwrap();
    let g0 = &f.gossipers[0];
    submit(&f, g0, "results").unwrap();
    assert_eq!(
        submit(&f, g0, "results").unwrap_err(),
        GossiperError::AlreadySubmitted(g0.actor_id())
    );

    // Signed by gossiper 2, submitted as gossiper 1.
    let g1 = &f.gossipers[1];
    let result = Digest::from_label("results");
    let message = proof_message(&channel(), &merkle_root(), EOT, &result);
    let forged = sign_message(message.as_bytes(), &f.gossipers[2].private);
    let err = f
        .pool
        .submit_proof(g1.actor_id(), channel(), EOT, merkle_root(), forged, result)
        .unwrap_err();
    assert_eq!(err, GossiperError::InvalidSignature(g1.actor_id()));
    assert_eq!(f.pool.channel(&channel()).unwrap().proofs.len(), 1);
}

#[test]
fn submission_to_unknown_channel_fails() {
    let f = fixture();
    assert_eq!(
        submit(&f, &f.gossipers[0], "results").unwrap_err(),
        GossiperError::ChannelNotFound(channel())
    );
}

#[test]
fn verifier_capability_is_injected() {
    let verifier = Arc::new(NullProofVerifier::new());
    let f = fixture_with(verifier.clone(), 3, 1);
    f.pool
        .init_channel(&OWNER, channel(), 3, 3, OWNER, Timestamp::new(10))
        .unwrap();

    let g0 = f.gossipers[0].actor_id();
    let g1 = f.gossipers[1].actor_id();
    verifier.reject_signer(g1);
    let result = Digest::from_label("results");
    f.pool
        .submit_proof(g0, channel(), EOT, merkle_root(), Signature([0; 64]), result)
        .unwrap();
    assert_eq!(
        f.pool
            .submit_proof(g1, channel(), EOT, merkle_root(), Signature([0; 64]), result)
            .unwrap_err(),
        GossiperError::InvalidSignature(g1)
    );
}

// ── Validation and termination ──────────────────────────────────────────

#[test]
fn validation_is_recallable_as_proofs_arrive() {
    let f = fixture();
    f.pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();
    assert!(!f.pool.validate_proof(channel()).unwrap());

    submit(&f, &f.gossipers[0], "results").unwrap();
    submit(&f, &f.gossipers[1], "other").unwrap();
    assert!(!f.pool.validate_proof(channel()).unwrap());

    submit(&f, &f.gossipers[2], "results").unwrap();
    assert!(f.pool.validate_proof(channel()).unwrap());
    assert!(f.pool.validate_proof(channel()).unwrap());
}

#[test]
fn terminate_requires_owner_and_validation_and_is_irreversible() {
    let f = fixture();
    f.pool
        .init_channel(&OWNER, channel(), 3, 3, OWNER, Timestamp::new(10))
        .unwrap();
    assert_eq!(
        f.pool.terminate_channel(&OWNER, channel()).unwrap_err(),
        GossiperError::NotValidated(channel())
    );

    for kp in &f.gossipers {
        submit(&f, kp, "results").unwrap();
    }
    f.pool.validate_proof(channel()).unwrap();
    let stranger = f.gossipers[0].actor_id();
    assert_eq!(
        f.pool.terminate_channel(&stranger, channel()).unwrap_err(),
        GossiperError::Unauthorized(stranger)
    );

    f.pool.terminate_channel(&OWNER, channel()).unwrap();
    assert_eq!(
        f.pool.terminate_channel(&OWNER, channel()).unwrap_err(),
        GossiperError::ChannelTerminated(channel())
    );
    assert_eq!(
        submit(&f, &f.gossipers[0], "late").unwrap_err(),
        GossiperError::ChannelTerminated(channel())
    );
}

#[test]
fn terminate_slashes_dissenting_gossiper_in_favour_of_majority() {
    let f = fixture();
    f.pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();
    let (honest_a, honest_b, liar) = (&f.gossipers[0], &f.gossipers[1], &f.gossipers[2]);
    submit(&f, honest_a, "results").unwrap();
    submit(&f, honest_b, "results").unwrap();
    submit(&f, liar, "fabricated").unwrap();
    assert!(f.pool.validate_proof(channel()).unwrap());

    let slashed = f.pool.terminate_channel(&OWNER, channel()).unwrap();
    assert_eq!(slashed, vec![liar.actor_id()]);

    let record = f.registry.actor(f.pool.stake_id(), &liar.actor_id()).unwrap();
    assert_eq!(record.staked_amount, 0);
    assert_eq!(record.max_slots, 0);
    assert_eq!(f.ledger.balance_of(&honest_a.actor_id()), 1 + AMOUNT / 2);
    assert_eq!(f.ledger.balance_of(&honest_b.actor_id()), 1 + AMOUNT / 2);
    assert_eq!(free_slots(&f, honest_a), 1);

    let outcomes: Vec<_> = f.events.events().iter().map(|e| e.outcome()).collect();
    assert!(outcomes.contains(&"slashed"));
    assert_eq!(outcomes.last(), Some(&"terminated"));
}

#[test]
fn even_split_never_validates() {
    let f = fixture_with(Arc::new(Ed25519ProofVerifier), 4, 1);
    f.pool
        .init_channel(&OWNER, channel(), 4, 2, OWNER, Timestamp::new(10))
        .unwrap();
    submit(&f, &f.gossipers[0], "honest-result").unwrap();
    submit(&f, &f.gossipers[1], "honest-result").unwrap();
    submit(&f, &f.gossipers[2], "fabricated").unwrap();
    submit(&f, &f.gossipers[3], "fabricated").unwrap();

    assert!(!f.pool.validate_proof(channel()).unwrap());
    assert!(!f.pool.is_valid_proof(&channel()));
    assert_eq!(f.pool.channel(&channel()).unwrap().agreed, None);
    assert!(matches!(
        f.pool.terminate_channel(&OWNER, channel()).unwrap_err(),
        GossiperError::NotValidated(_)
    ));
    for kp in &f.gossipers {
        assert_eq!(free_slots(&f, kp), 0);
        assert_eq!(f.ledger.balance_of(&kp.actor_id()), 1);
    }
}

#[test]
fn later_proof_breaks_a_tie() {
    let f = fixture_with(Arc::new(Ed25519ProofVerifier), 5, 1);
    f.pool
        .init_channel(&OWNER, channel(), 5, 2, OWNER, Timestamp::new(10))
        .unwrap();
    submit(&f, &f.gossipers[0], "honest-result").unwrap();
    submit(&f, &f.gossipers[1], "fabricated").unwrap();
    submit(&f, &f.gossipers[2], "fabricated").unwrap();
    submit(&f, &f.gossipers[3], "honest-result").unwrap();
    assert!(!f.pool.validate_proof(channel()).unwrap());

    submit(&f, &f.gossipers[4], "honest-result").unwrap();
    assert!(f.pool.validate_proof(channel()).unwrap());
    let agreed = f.pool.channel(&channel()).unwrap().agreed.unwrap();
    assert_eq!(agreed.result_digest, Digest::from_label("honest-result"));

    let mut slashed = f.pool.terminate_channel(&OWNER, channel()).unwrap();
    slashed.sort();
    let mut liars = vec![f.gossipers[1].actor_id(), f.gossipers[2].actor_id()];
    liars.sort();
    assert_eq!(slashed, liars);
}

#[test]
fn failed_slash_leaves_channel_open() {
    let f = build(Arc::new(Ed25519ProofVerifier), 3, 1, false);
    f.pool
        .init_channel(&OWNER, channel(), 3, 2, OWNER, Timestamp::new(10))
        .unwrap();
    submit(&f, &f.gossipers[0], "results").unwrap();
    submit(&f, &f.gossipers[1], "results").unwrap();
    assert!(f.pool.validate_proof(channel()).unwrap());

    let silent = &f.gossipers[2];
    assert!(matches!(
        f.pool.terminate_channel(&OWNER, channel()).unwrap_err(),
        GossiperError::Registry(RegistryError::Stake(_))
    ));
    assert!(!f.pool.is_channel_terminated(&channel()));
    assert_eq!(free_slots(&f, silent), 0);
    assert!(matches!(
        f.pool.deregister_gossiper(silent.actor_id()).unwrap_err(),
        GossiperError::Registry(RegistryError::SlotsInUse { .. })
    ));

    f.registry.vault().authorize(REGISTRY);
    let slashed = f.pool.terminate_channel(&OWNER, channel()).unwrap();
    assert_eq!(slashed, vec![silent.actor_id()]);
    let record = f.registry.actor(f.pool.stake_id(), &silent.actor_id()).unwrap();
    assert_eq!((record.max_slots, record.staked_amount), (0, 0));
}

#[test]
fn registration_limits_are_enforced() {
    let f = fixture();
    let newcomer = ActorId::new([0x42; 32]);
    f.ledger.mint(&newcomer, 10_000);
    f.ledger.approve(&newcomer, &VAULT, 10_000);

    assert!(matches!(
        f.pool
            .register_gossiper(newcomer, 9, 1, Timestamp::new(1))
            .unwrap_err(),
        GossiperError::StakeTooLow { minimum: 10, .. }
    ));
    assert!(matches!(
        f.pool
            .register_gossiper(newcomer, 10, 0, Timestamp::new(1))
            .unwrap_err(),
        GossiperError::TooFewSlots { .. }
    ));
    assert!(matches!(
        f.pool
            .register_gossiper(newcomer, 10, 33, Timestamp::new(1))
            .unwrap_err(),
        GossiperError::TooManySlots { maximum: 32, .. }
    ));
    assert!(!f.pool.is_registered_gossiper(&newcomer));
}
