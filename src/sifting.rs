//! Basis/angle reconciliation.

use crate::protocols::qkd::TransmissionRecord;

/// Sender and receiver bits of one kept transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiftedPair {
    pub sender: bool,
    pub receiver: bool,
}

impl SiftedPair {
    pub fn is_mismatch(&self) -> bool {
        self.sender != self.receiver
    }
}

/// Bits of the transmissions whose references matched, in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiftedSequence {
    pairs: Vec<SiftedPair>,
}

impl SiftedSequence {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[SiftedPair] {
        &self.pairs
    }

    pub fn get(&self, index: usize) -> Option<&SiftedPair> {
        self.pairs.get(index)
    }

    /// Disagreements over the whole sequence.
    pub fn mismatches(&self) -> usize {
        self.pairs.iter().filter(|p| p.is_mismatch()).count()
    }

    /// Error rate over the whole sequence, 0.0 when empty.
    pub fn qber(&self) -> f64 {
        if self.pairs.is_empty() {
            0.0
        } else {
            self.mismatches() as f64 / self.pairs.len() as f64
        }
    }
}

impl FromIterator<SiftedPair> for SiftedSequence {
    fn from_iter<I: IntoIterator<Item = SiftedPair>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().collect(),
        }
    }
}

/// Keeps the transmissions where sender and receiver used exactly the same
/// basis or angle.
pub fn sift<B: PartialEq>(records: &[TransmissionRecord<B>]) -> SiftedSequence {
    records
        .iter()
        .filter(|r| r.bases_match())
        .map(|r| SiftedPair {
            sender: r.sender_bit,
            receiver: r.receiver_bit,
        })
        .collect()
}
