//! Cryptographic primitives for the attest protocol.
//!
//! - **Ed25519** for signing gossiper proofs and verifying them
//! - **Blake2b-256** for commit hashes, proof digests and identifier derivation

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{blake2b_256, blake2b_256_multi, digest_of};
pub use keys::{generate_keypair, keypair_from_seed, public_from_private};
pub use sign::{sign_message, verify_signature};
