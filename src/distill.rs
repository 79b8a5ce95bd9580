//! Key distillation: drop the revealed sample, compare raw keys and compress
//! the sender's raw key with SHA-256.
//!
//! The compression step is a single hash, not a universal-hashing privacy
//! amplification scheme, and no error correction is attempted.

use crate::estimator::{Decision, QberEstimate};
use crate::sifting::SiftedSequence;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// Raw keys of both parties and the compressed final key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistilledKey {
    pub sender_raw: Vec<bool>,
    pub receiver_raw: Vec<bool>,
    pub keys_match: bool,
    /// Lowercase hex SHA-256 of the sender's raw key, empty for an empty key.
    pub final_key: String,
}

/// Builds the key from every sifted position outside the sample.
///
/// Returns `None` when the estimate decided to abort.
pub fn distill(sifted: &SiftedSequence, estimate: &QberEstimate) -> Option<DistilledKey> {
    if estimate.decision == Decision::Abort {
        return None;
    }

    let (sender_raw, receiver_raw): (Vec<bool>, Vec<bool>) = sifted
        .pairs()
        .iter()
        .enumerate()
        .filter(|(i, _)| !estimate.sample.contains(i))
        .map(|(_, p)| (p.sender, p.receiver))
        .unzip();

    let keys_match = sender_raw == receiver_raw;
    if !keys_match {
        let differing = sender_raw
            .iter()
            .zip(&receiver_raw)
            .filter(|(a, b)| a != b)
            .count();
        warn!(
            differing,
            length = sender_raw.len(),
            "raw keys differ; reconciliation would be required"
        );
    }

    let final_key = compress(&sender_raw);
    info!(raw_length = sender_raw.len(), keys_match, "final key distilled");

    Some(DistilledKey {
        sender_raw,
        receiver_raw,
        keys_match,
        final_key,
    })
}

/// Hex SHA-256 of the big-endian byte encoding of `bits`.
pub fn compress(bits: &[bool]) -> String {
    if bits.is_empty() {
        return String::new();
    }
    hex::encode(Sha256::digest(bits_to_bytes(bits)))
}

/// Encodes `bits` as a big-endian integer in `ceil(len / 8)` bytes.
///
/// The most significant byte is left-padded with zero bits, so the leading
/// zeros of the bit string survive the round trip through
/// [`bytes_to_bits`].
pub fn bits_to_bytes(bits: &[bool]) -> Vec<u8> {
    let padding = (8 - bits.len() % 8) % 8;
    let mut bytes = Vec::with_capacity(bits.len().div_ceil(8));
    let mut current = 0u8;

    for (i, &bit) in bits.iter().enumerate() {
        current = (current << 1) | bit as u8;
        if (i + padding + 1) % 8 == 0 {
            bytes.push(current);
            current = 0;
        }
    }

    bytes
}

/// Inverse of [`bits_to_bytes`] for a bit string of known length.
///
/// # Panics
///
/// Panics if `bytes` is not exactly `ceil(len / 8)` long.
pub fn bytes_to_bits(bytes: &[u8], len: usize) -> Vec<bool> {
    assert_eq!(
        bytes.len(),
        len.div_ceil(8),
        "{len} bits need {} bytes",
        len.div_ceil(8)
    );
    let padding = bytes.len() * 8 - len;

    bytes
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .skip(padding)
        .collect()
}

/// Renders bits as a `0`/`1` string.
pub fn bit_string(bits: &[bool]) -> String {
    bits.iter().map(|&b| if b { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sifting::SiftedPair;
    use std::collections::BTreeSet;

    fn bits(s: &str) -> Vec<bool> {
        s.chars().map(|c| c == '1').collect()
    }

    fn estimate(sample: &[usize], decision: Decision) -> QberEstimate {
        QberEstimate {
            sample: sample.iter().copied().collect::<BTreeSet<_>>(),
            mismatches: 0,
            qber: 0.0,
            threshold: 0.11,
            decision,
        }
    }

    #[test]
    fn test_bits_to_bytes_is_big_endian() {
        assert_eq!(bits_to_bytes(&[]), Vec::<u8>::new());
        assert_eq!(bits_to_bytes(&bits("1")), vec![0x01]);
        assert_eq!(bits_to_bytes(&bits("10000000")), vec![0x80]);
        assert_eq!(bits_to_bytes(&bits("101")), vec![0x05]);
        assert_eq!(bits_to_bytes(&bits("100000000")), vec![0x01, 0x00]);
        assert_eq!(bits_to_bytes(&bits("0000000011111111")), vec![0x00, 0xff]);
        assert_eq!(bits_to_bytes(&bits("000000001")), vec![0x00, 0x01]);
    }

    #[test]
    fn test_bytes_to_bits_keeps_leading_zeros() {
        assert_eq!(bytes_to_bits(&[0x00, 0x01], 9), bits("000000001"));
        assert_eq!(bytes_to_bits(&[0x05], 3), bits("101"));
        assert_eq!(bytes_to_bits(&[0x05], 8), bits("00000101"));
        assert!(bytes_to_bits(&[], 0).is_empty());
    }

    #[test]
    fn test_compress_empty_key() {
        assert_eq!(compress(&[]), "");
    }

    #[test]
    fn test_compress_known_digest() {
        // "10000000" encodes to the single byte 0x80
        assert_eq!(
            compress(&bits("10000000")),
            hex::encode(Sha256::digest([0x80u8]))
        );
        assert_eq!(compress(&bits("10000000")).len(), 64);
    }

    #[test]
    fn test_digest_depends_on_byte_encoding() {
        // Same integer value, different byte length.
        assert_ne!(compress(&bits("1")), compress(&bits("000000001")));
        // Same byte encoding.
        assert_eq!(compress(&bits("1")), compress(&bits("00000001")));
    }

    #[test]
    fn test_distill_skips_sample() {
        let sifted: SiftedSequence = [(true, true), (false, true), (true, true), (false, false)]
            .iter()
            .map(|&(sender, receiver)| SiftedPair { sender, receiver })
            .collect();

        let key = distill(&sifted, &estimate(&[1], Decision::Proceed)).unwrap();
        assert_eq!(key.sender_raw, bits("110"));
        assert_eq!(key.receiver_raw, bits("110"));
        assert!(key.keys_match);
        assert_eq!(key.final_key, compress(&bits("110")));
        assert_eq!(
            sifted.len(),
            key.sender_raw.len() + estimate(&[1], Decision::Proceed).sample_size()
        );
    }

    #[test]
    fn test_distill_reports_mismatch() {
        let sifted: SiftedSequence = [(true, true), (false, true)]
            .iter()
            .map(|&(sender, receiver)| SiftedPair { sender, receiver })
            .collect();

        let key = distill(&sifted, &estimate(&[0], Decision::Proceed)).unwrap();
        assert!(!key.keys_match);
        assert_eq!(key.final_key, compress(&bits("0")));
    }

    #[test]
    fn test_distill_empty_raw_key() {
        let sifted: SiftedSequence = [SiftedPair {
            sender: true,
            receiver: true,
        }]
        .into_iter()
        .collect();

        let key = distill(&sifted, &estimate(&[0], Decision::Proceed)).unwrap();
        assert!(key.sender_raw.is_empty());
        assert!(key.keys_match);
        assert_eq!(key.final_key, "");
    }

    #[test]
    fn test_abort_produces_no_key() {
        let sifted: SiftedSequence = [SiftedPair {
            sender: true,
            receiver: false,
        }; 4]
            .into_iter()
            .collect();
        assert!(distill(&sifted, &estimate(&[0], Decision::Abort)).is_none());
    }
}
