//! Seedable randomness shared by every stage of a protocol run.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

const SUBSTREAM_LABEL: &[u8] = b"qkdsim/transmission";

/// Pseudorandom source for bits, basis/angle choices and sample selection.
///
/// A source built with [`RandomSource::from_seed`] replays exactly the same
/// sequence of draws, which is what makes protocol runs reproducible.
#[derive(Debug, Clone)]
pub struct RandomSource {
    rng: StdRng,
}

impl RandomSource {
    /// Deterministic source.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Independent stream for transmission `index`.
    ///
    /// The stream depends only on `(stream_seed, index)`, never on the order in
    /// which indices are simulated.
    pub fn substream(stream_seed: u64, index: usize) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(stream_seed.to_le_bytes());
        hasher.update((index as u64).to_le_bytes());
        hasher.update(SUBSTREAM_LABEL);
        let digest = hasher.finalize();

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&digest);
        Self {
            rng: StdRng::from_seed(seed),
        }
    }

    /// Uniform bit.
    pub fn random_bit(&mut self) -> bool {
        self.rng.random_bool(0.5)
    }

    /// Uniform choice over a finite set of bases or angles.
    ///
    /// # Panics
    ///
    /// Panics if `choices` is empty.
    pub fn random_basis<T: Copy>(&mut self, choices: &[T]) -> T {
        assert!(!choices.is_empty(), "cannot choose from an empty set");
        choices[self.rng.random_range(0..choices.len())]
    }

    /// `k` distinct indices drawn uniformly from `[0, n)`.
    ///
    /// # Panics
    ///
    /// Panics if `k > n`.
    pub fn random_subset(&mut self, n: usize, k: usize) -> BTreeSet<usize> {
        assert!(k <= n, "cannot draw {k} distinct indices from {n}");
        rand::seq::index::sample(&mut self.rng, n, k)
            .into_iter()
            .collect()
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    pub fn random_event(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Fresh 64-bit seed, used to key per-index sub-streams.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }
}

impl Default for RandomSource {
    fn default() -> Self {
        Self::from_entropy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_sources_replay() {
        let mut a = RandomSource::from_seed(7);
        let mut b = RandomSource::from_seed(7);
        let xs: Vec<bool> = (0..64).map(|_| a.random_bit()).collect();
        let ys: Vec<bool> = (0..64).map(|_| b.random_bit()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_random_bit_is_balanced() {
        let mut rng = RandomSource::from_seed(1);
        let ones = (0..10_000).filter(|_| rng.random_bit()).count();
        assert!((4_700..=5_300).contains(&ones), "ones = {ones}");
    }

    #[test]
    fn test_random_basis_covers_choices() {
        let mut rng = RandomSource::from_seed(2);
        let choices = [10, 20, 30];
        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            let c = rng.random_basis(&choices);
            assert!(choices.contains(&c));
            seen.insert(c);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_random_subset() {
        let mut rng = RandomSource::from_seed(3);
        let subset = rng.random_subset(50, 12);
        assert_eq!(subset.len(), 12);
        assert!(subset.iter().all(|&i| i < 50));

        assert_eq!(rng.random_subset(5, 5), (0..5).collect());
        assert!(rng.random_subset(5, 0).is_empty());
    }

    #[test]
    #[should_panic]
    fn test_random_subset_rejects_oversized_sample() {
        RandomSource::from_seed(4).random_subset(3, 4);
    }

    #[test]
    #[should_panic]
    fn test_random_basis_rejects_empty_set() {
        let empty: [u8; 0] = [];
        RandomSource::from_seed(5).random_basis(&empty);
    }

    #[test]
    fn test_substreams_are_order_independent() {
        let forward: Vec<bool> = (0..16)
            .map(|i| RandomSource::substream(99, i).random_bit())
            .collect();
        let backward: Vec<bool> = (0..16)
            .rev()
            .map(|i| RandomSource::substream(99, i).random_bit())
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert_eq!(forward, backward);

        let mut a = RandomSource::substream(99, 0);
        let mut b = RandomSource::substream(99, 1);
        let xs: Vec<u64> = (0..4).map(|_| a.next_seed()).collect();
        let ys: Vec<u64> = (0..4).map(|_| b.next_seed()).collect();
        assert_ne!(xs, ys);
    }
}
