//! Signature verification capability for submitted proofs.

use attest_types::{ActorId, Signature};

/// Checks that `signer` produced `signature` over `message`.
///
/// Injected into the pool so tests and simulations can substitute it.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, signer: &ActorId, message: &[u8], signature: &Signature) -> bool;
}

/// Ed25519 verification against the signer's actor id (its public key).
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519ProofVerifier;

impl ProofVerifier for Ed25519ProofVerifier {
    fn verify(&self, signer: &ActorId, message: &[u8], signature: &Signature) -> bool {
        attest_crypto::verify_signature(message, signature, signer)
    }
}
