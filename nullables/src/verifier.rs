//! Nullable proof verifier: signature checks decided by the test.

use attest_gossipers::ProofVerifier;
use attest_types::{ActorId, Signature};
use parking_lot::Mutex;
use std::collections::HashSet;

/// A proof verifier that accepts every signature except those from signers
/// the test has marked as forging.
#[derive(Debug, Default)]
pub struct NullProofVerifier {
    rejected: Mutex<HashSet<ActorId>>,
}

impl NullProofVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every signature from `signer` from now on.
    pub fn reject_signer(&self, signer: ActorId) {
        self.rejected.lock().insert(signer);
    }
}

impl ProofVerifier for NullProofVerifier {
    fn verify(&self, signer: &ActorId, _message: &[u8], _signature: &Signature) -> bool {
        !self.rejected.lock().contains(signer)
    }
}
