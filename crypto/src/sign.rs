//! Ed25519 signatures over proof messages.

use attest_types::{ActorId, PrivateKey, Signature};
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    Signature(SigningKey::from_bytes(&private_key.0).sign(message).to_bytes())
}

/// Whether `signer` produced `signature` over `message`. An actor id that
/// is not a valid curve point never verifies.
pub fn verify_signature(message: &[u8], signature: &Signature, signer: &ActorId) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(signer.as_bytes()) else {
        return false;
    };
    key.verify(message, &ed25519_dalek::Signature::from_bytes(&signature.0))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::keypair_from_seed;

    #[test]
    fn gossiper_signature_verifies_against_its_id() {
        let kp = keypair_from_seed(&[1u8; 32]);
        let sig = sign_message(b"proof of training", &kp.private);
        assert!(verify_signature(b"proof of training", &sig, &kp.actor_id()));
        assert!(!verify_signature(b"another result", &sig, &kp.actor_id()));
    }

    #[test]
    fn signature_does_not_transfer_to_another_actor() {
        let signer = keypair_from_seed(&[1u8; 32]);
        let other = keypair_from_seed(&[2u8; 32]);
        let sig = sign_message(b"test", &signer.private);
        assert!(!verify_signature(b"test", &sig, &other.actor_id()));
    }

    #[test]
    fn off_curve_actor_never_verifies() {
        let kp = keypair_from_seed(&[7u8; 32]);
        let sig = sign_message(b"test", &kp.private);
        assert!(!verify_signature(b"test", &sig, &ActorId::new([0xFF; 32])));
    }
}
