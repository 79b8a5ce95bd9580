use crate::config::{Protocol, SimulationConfig};
use crate::core::errors::{ConfigError, ProtocolError};
use crate::core::RandomSource;
use crate::distill::DistilledKey;
use crate::estimator::{ParameterEstimator, QberEstimate};
use crate::protocols::qkd::e91::AngleChoices;
use crate::protocols::qkd::{Summary, bb84, e91};
use crate::sifting::SiftedSequence;
use tracing::info_span;

/// Result of a configured run, tagged by protocol.
#[derive(Debug, Clone)]
pub enum SimulationOutcome {
    Bb84(bb84::Bb84Result),
    E91(e91::E91Result),
}

impl SimulationOutcome {
    pub fn protocol(&self) -> Protocol {
        match self {
            SimulationOutcome::Bb84(_) => Protocol::Bb84,
            SimulationOutcome::E91(_) => Protocol::E91,
        }
    }

    pub fn sifted(&self) -> &SiftedSequence {
        match self {
            SimulationOutcome::Bb84(run) => &run.sifted,
            SimulationOutcome::E91(run) => &run.sifted,
        }
    }

    pub fn estimate(&self) -> &QberEstimate {
        match self {
            SimulationOutcome::Bb84(run) => &run.estimate,
            SimulationOutcome::E91(run) => &run.estimate,
        }
    }

    pub fn key(&self) -> Option<&DistilledKey> {
        match self {
            SimulationOutcome::Bb84(run) => run.key.as_ref(),
            SimulationOutcome::E91(run) => run.key.as_ref(),
        }
    }

    pub fn summary(&self) -> &Summary {
        match self {
            SimulationOutcome::Bb84(run) => &run.summary,
            SimulationOutcome::E91(run) => &run.summary,
        }
    }
}

/// Runs the protocol selected by a [`SimulationConfig`].
///
/// The configuration is validated once, on construction.
#[derive(Debug, Clone)]
pub struct QkdSimulator {
    config: SimulationConfig,
    estimator: ParameterEstimator,
    angles: AngleChoices,
}

impl QkdSimulator {
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            estimator: config.estimator()?,
            angles: config.angles.choices()?,
            config,
        })
    }

    /// Fixes the seed of subsequent runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Fresh source for one run: seeded if configured, OS entropy otherwise.
    pub fn random_source(&self) -> RandomSource {
        match self.config.seed {
            Some(seed) => RandomSource::from_seed(seed),
            None => RandomSource::from_entropy(),
        }
    }

    pub fn run(&self) -> Result<SimulationOutcome, ProtocolError> {
        let mut rng = self.random_source();
        self.run_with(&mut rng)
    }

    /// Runs with a caller-provided randomness source.
    pub fn run_with(&self, rng: &mut RandomSource) -> Result<SimulationOutcome, ProtocolError> {
        let span = info_span!(
            "qkd",
            protocol = %self.config.protocol,
            transmissions = self.config.transmissions,
            eavesdropper = self.config.eavesdropper,
        );
        let _guard = span.enter();

        let n = self.config.transmissions;
        let eve = self.config.eavesdropper;
        match self.config.protocol {
            Protocol::Bb84 => bb84::run(n, eve, &self.estimator, rng).map(SimulationOutcome::Bb84),
            Protocol::E91 => e91::run(n, eve, self.angles.clone(), &self.estimator, rng)
                .map(SimulationOutcome::E91),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected_on_construction() {
        let config = SimulationConfig {
            sample_fraction: 2.0,
            ..SimulationConfig::default()
        };
        assert_eq!(
            QkdSimulator::new(config).unwrap_err(),
            ConfigError::InvalidSampleFraction(2.0)
        );
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let simulator = QkdSimulator::new(SimulationConfig {
            eavesdropper: true,
            ..SimulationConfig::default()
        })
        .unwrap()
        .with_seed(5);

        let a = simulator.run().unwrap();
        let b = simulator.run().unwrap();
        assert_eq!(a.sifted(), b.sifted());
        assert_eq!(a.estimate(), b.estimate());
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_dispatches_on_protocol() {
        let simulator = QkdSimulator::new(SimulationConfig {
            protocol: Protocol::E91,
            transmissions: 300,
            ..SimulationConfig::default()
        })
        .unwrap()
        .with_seed(6);

        let outcome = simulator.run().unwrap();
        assert_eq!(outcome.protocol(), Protocol::E91);
        assert_eq!(outcome.summary().transmissions, 300);
        assert_eq!(outcome.summary().full_mismatches, 0);
    }
}
