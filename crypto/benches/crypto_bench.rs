use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Gossipers sign a 32-byte proof message digest.
fn proof_signing(c: &mut Criterion) {
    let kp = attest_crypto::keypair_from_seed(&[7u8; 32]);
    let message = attest_crypto::blake2b_256(b"proof message");
    let sig = attest_crypto::sign_message(&message, &kp.private);
    let signer = kp.actor_id();

    c.bench_function("sign_proof_message", |b| {
        b.iter(|| attest_crypto::sign_message(black_box(&message), &kp.private))
    });
    c.bench_function("verify_proof_message", |b| {
        b.iter(|| attest_crypto::verify_signature(black_box(&message), &sig, &signer))
    });
}

/// A commit preimage is one vote byte followed by a 32-byte salt.
fn commit_hashing(c: &mut Criterion) {
    let vote = [1u8];
    let salt = [0x5Au8; 32];

    c.bench_function("commit_hash", |b| {
        b.iter(|| attest_crypto::digest_of(black_box(&[&vote, &salt])))
    });
}

/// Selection ranks every eligible actor by hashing the seed with its id.
fn selection_ranking(c: &mut Criterion) {
    let seed = [0x11u8; 32];
    let actors: Vec<[u8; 32]> = (0..=255u8).map(|i| [i; 32]).collect();

    c.bench_function("rank_256_actors", |b| {
        b.iter(|| {
            actors
                .iter()
                .map(|actor| attest_crypto::blake2b_256_multi(&[&seed, actor]))
                .min()
        })
    });
}

criterion_group!(benches, proof_signing, commit_hashing, selection_ranking);
criterion_main!(benches);
