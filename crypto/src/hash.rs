//! Blake2b-256 hashing for identifiers, commit hashes and proof messages.

use attest_types::Digest;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest as _};

type Blake2b256 = Blake2b<U32>;

fn finish(hasher: Blake2b256) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&hasher.finalize());
    out
}

pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    finish(Blake2b256::new_with_prefix(data))
}

/// Hash `parts` as if concatenated, without building the concatenation.
///
/// Callers that hash variable-length fields put a domain tag first and
/// length prefixes where a boundary could shift.
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    finish(hasher)
}

/// [`blake2b_256_multi`] wrapped as a protocol [`Digest`].
pub fn digest_of(parts: &[&[u8]]) -> Digest {
    Digest::new(blake2b_256_multi(parts))
}
