//! Run configuration.
//!
//! Every field has a default, so a TOML file only needs the values it changes:
//!
//! ```toml
//! protocol = "e91"
//! transmissions = 500
//! eavesdropper = true
//! seed = 7
//!
//! [angles]
//! sender = ["0", "pi/8", "pi/4"]
//! ```

use crate::core::errors::ConfigError;
use crate::core::Angle;
use crate::estimator::ParameterEstimator;
use crate::protocols::qkd::e91::AngleChoices;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_TRANSMISSIONS: usize = 200;
pub const DEFAULT_SAMPLE_FRACTION: f64 = 0.25;
pub const DEFAULT_QBER_THRESHOLD: f64 = 0.11;
pub const DEFAULT_SHOW_TRANSMISSIONS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Bb84,
    E91,
}

impl FromStr for Protocol {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bb84" => Ok(Protocol::Bb84),
            "e91" => Ok(Protocol::E91),
            _ => Err(ConfigError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Bb84 => f.write_str("BB84"),
            Protocol::E91 => f.write_str("E91"),
        }
    }
}

/// E91 angle labels per party, see [`Angle`]'s `FromStr` for the syntax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AngleConfig {
    pub sender: Vec<String>,
    pub receiver: Vec<String>,
    pub eavesdropper: Vec<String>,
}

impl Default for AngleConfig {
    fn default() -> Self {
        let labels = |set: &[&str]| -> Vec<String> {
            set.iter().map(|s| s.to_string()).collect()
        };
        Self {
            sender: labels(&["0", "pi/4", "pi/2"]),
            receiver: labels(&["pi/4", "pi/2", "3pi/4"]),
            eavesdropper: labels(&["0", "pi/4", "pi/2"]),
        }
    }
}

impl AngleConfig {
    pub fn choices(&self) -> Result<AngleChoices, ConfigError> {
        AngleChoices::new(
            Angle::parse_all(&self.sender)?,
            Angle::parse_all(&self.receiver)?,
            Angle::parse_all(&self.eavesdropper)?,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub protocol: Protocol,
    /// Qubits (BB84) or entangled pairs (E91) sent.
    pub transmissions: usize,
    /// Fraction of the sifted key revealed for QBER estimation.
    pub sample_fraction: f64,
    /// Abort when the sample QBER exceeds this.
    pub qber_threshold: f64,
    pub eavesdropper: bool,
    /// Fixed seed for a reproducible run; OS entropy otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Transmission records printed by the reporter.
    pub show_transmissions: usize,
    pub angles: AngleConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            transmissions: DEFAULT_TRANSMISSIONS,
            sample_fraction: DEFAULT_SAMPLE_FRACTION,
            qber_threshold: DEFAULT_QBER_THRESHOLD,
            eavesdropper: false,
            seed: None,
            show_transmissions: DEFAULT_SHOW_TRANSMISSIONS,
            angles: AngleConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: origin.to_string(),
            reason: e.to_string(),
        })
    }

    /// Loads and validates a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content, &origin)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<generated>".to_string(),
            reason: e.to_string(),
        })
    }

    pub fn estimator(&self) -> Result<ParameterEstimator, ConfigError> {
        ParameterEstimator::new(self.sample_fraction, self.qber_threshold)
    }

    /// Checks every range and parses every angle label.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transmissions == 0 {
            return Err(ConfigError::NoTransmissions);
        }
        self.estimator()?;
        self.angles.choices()?;
        Ok(())
    }
}
