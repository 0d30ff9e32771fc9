//! The message a gossiper signs.

use attest_types::{ChannelId, Digest};

const PROOF_DOMAIN: &[u8] = b"attest-proof-of-training-v1";

/// Digest signed by a gossiper for one channel.
///
/// Covers the channel, every merkle leaf in order, the end-of-training
/// marker and the result digest. Lengths are included so leaf and marker
/// boundaries cannot shift.
pub fn proof_message(
    channel_id: &ChannelId,
    merkle_root: &[Digest],
    end_of_training: &str,
    result_digest: &Digest,
) -> Digest {
    let leaves = (merkle_root.len() as u64).to_le_bytes();
    let marker_len = (end_of_training.len() as u64).to_le_bytes();
    let mut parts: Vec<&[u8]> = Vec::with_capacity(merkle_root.len() + 6);
    parts.push(PROOF_DOMAIN);
    parts.push(channel_id.as_bytes());
    parts.push(&leaves);
    parts.extend(merkle_root.iter().map(|leaf| &leaf.as_bytes()[..]));
    parts.push(&marker_len);
    parts.push(end_of_training.as_bytes());
    parts.push(result_digest.as_bytes());
    attest_crypto::digest_of(&parts)
}
