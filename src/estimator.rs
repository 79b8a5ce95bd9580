//! QBER estimation on a revealed sample of the sifted key.

use crate::core::RandomSource;
use crate::errors::{ConfigError, ProtocolError};
use crate::sifting::SiftedSequence;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Whether the run continues to key distillation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    /// QBER above threshold: possible eavesdropping, no key is produced.
    Abort,
}

/// Outcome of parameter estimation.
#[derive(Debug, Clone, PartialEq)]
pub struct QberEstimate {
    /// Revealed positions in the sifted sequence.
    pub sample: BTreeSet<usize>,
    pub mismatches: usize,
    pub qber: f64,
    pub threshold: f64,
    pub decision: Decision,
}

impl QberEstimate {
    pub fn sample_size(&self) -> usize {
        self.sample.len()
    }
}

/// Samples a fraction of the sifted sequence and compares the error rate
/// against an abort threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterEstimator {
    sample_fraction: f64,
    threshold: f64,
}

impl ParameterEstimator {
    /// Both parameters must lie in (0, 1].
    pub fn new(sample_fraction: f64, threshold: f64) -> Result<Self, ConfigError> {
        if !(sample_fraction > 0.0 && sample_fraction <= 1.0) {
            return Err(ConfigError::InvalidSampleFraction(sample_fraction));
        }
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::InvalidThreshold(threshold));
        }
        Ok(Self {
            sample_fraction,
            threshold,
        })
    }

    pub fn sample_fraction(&self) -> f64 {
        self.sample_fraction
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// `max(1, floor(fraction * len))`, never more than `len`.
    pub fn sample_size(&self, len: usize) -> usize {
        let size = (self.sample_fraction * len as f64).floor() as usize;
        size.clamp(1, len.max(1))
    }

    pub fn estimate(
        &self,
        sifted: &SiftedSequence,
        rng: &mut RandomSource,
    ) -> Result<QberEstimate, ProtocolError> {
        if sifted.is_empty() {
            return Err(ProtocolError::EmptySiftedSequence);
        }

        let sample = rng.random_subset(sifted.len(), self.sample_size(sifted.len()));
        let mismatches = sample
            .iter()
            .filter(|&&i| sifted.pairs()[i].is_mismatch())
            .count();
        let qber = mismatches as f64 / sample.len() as f64;

        let decision = if qber <= self.threshold {
            info!(
                qber,
                threshold = self.threshold,
                sample_size = sample.len(),
                "QBER within threshold, proceeding"
            );
            Decision::Proceed
        } else {
            warn!(
                qber,
                threshold = self.threshold,
                sample_size = sample.len(),
                "QBER above threshold, possible eavesdropping: aborting"
            );
            Decision::Abort
        };

        Ok(QberEstimate {
            sample,
            mismatches,
            qber,
            threshold: self.threshold,
            decision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sifting::SiftedPair;

    fn sequence(bits: &[(bool, bool)]) -> SiftedSequence {
        bits.iter()
            .map(|&(sender, receiver)| SiftedPair { sender, receiver })
            .collect()
    }

    #[test]
    fn test_rejects_out_of_range_parameters() {
        assert!(ParameterEstimator::new(0.0, 0.11).is_err());
        assert!(ParameterEstimator::new(1.5, 0.11).is_err());
        assert!(ParameterEstimator::new(f64::NAN, 0.11).is_err());
        assert!(ParameterEstimator::new(0.25, 0.0).is_err());
        assert!(ParameterEstimator::new(0.25, 1.01).is_err());
        assert!(ParameterEstimator::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_sample_size() {
        let estimator = ParameterEstimator::new(0.25, 0.11).unwrap();
        assert_eq!(estimator.sample_size(1), 1);
        assert_eq!(estimator.sample_size(3), 1);
        assert_eq!(estimator.sample_size(4), 1);
        assert_eq!(estimator.sample_size(8), 2);
        assert_eq!(estimator.sample_size(103), 25);

        let all = ParameterEstimator::new(1.0, 0.11).unwrap();
        assert_eq!(all.sample_size(17), 17);
    }

    #[test]
    fn test_empty_sequence_fails() {
        let estimator = ParameterEstimator::new(0.25, 0.11).unwrap();
        let mut rng = RandomSource::from_seed(40);
        assert_eq!(
            estimator.estimate(&SiftedSequence::default(), &mut rng),
            Err(ProtocolError::EmptySiftedSequence)
        );
    }

    #[test]
    fn test_clean_sequence_proceeds() {
        let estimator = ParameterEstimator::new(0.5, 0.11).unwrap();
        let mut rng = RandomSource::from_seed(41);
        let sifted = sequence(&[(true, true); 40]);
        let estimate = estimator.estimate(&sifted, &mut rng).unwrap();
        assert_eq!(estimate.sample_size(), 20);
        assert_eq!(estimate.mismatches, 0);
        assert_eq!(estimate.qber, 0.0);
        assert_eq!(estimate.decision, Decision::Proceed);
    }

    #[test]
    fn test_noisy_sequence_aborts() {
        let estimator = ParameterEstimator::new(1.0, 0.11).unwrap();
        let mut rng = RandomSource::from_seed(42);
        let sifted = sequence(&[(true, true), (true, false), (false, false), (false, true)]);
        let estimate = estimator.estimate(&sifted, &mut rng).unwrap();
        assert_eq!(estimate.mismatches, 2);
        assert_eq!(estimate.qber, 0.5);
        assert_eq!(estimate.decision, Decision::Abort);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let estimator = ParameterEstimator::new(1.0, 0.5).unwrap();
        let mut rng = RandomSource::from_seed(43);
        let sifted = sequence(&[(true, false), (true, true)]);
        let estimate = estimator.estimate(&sifted, &mut rng).unwrap();
        assert_eq!(estimate.qber, 0.5);
        assert_eq!(estimate.decision, Decision::Proceed);
    }
}
