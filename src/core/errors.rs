use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid basis label '{0}': expected 'Z' or 'X'")]
    InvalidBasis(String),

    #[error("Invalid angle label '{0}'")]
    InvalidAngle(String),

    #[error("Angle must be a finite number of radians, got {0}")]
    NonFiniteAngle(f64),

    #[error("The {0} angle set must contain at least one angle")]
    EmptyAngleSet(&'static str),

    #[error("Transmission count must be at least 1")]
    NoTransmissions,

    #[error("Invalid sample fraction: {0}. Must be in (0.0, 1.0]")]
    InvalidSampleFraction(f64),

    #[error("Invalid QBER threshold: {0}. Must be in (0.0, 1.0]")]
    InvalidThreshold(f64),

    #[error("Unknown protocol '{0}': expected 'bb84' or 'e91'")]
    UnknownProtocol(String),

    #[error("Cannot read configuration file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Cannot parse configuration file {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    #[error(
        "Sifted key is empty after {transmissions} transmissions; increase the transmission count or reconsider the parameters"
    )]
    InsufficientData { transmissions: usize },

    #[error("Cannot estimate the QBER of an empty sifted sequence")]
    EmptySiftedSequence,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
