//! Encoding and measurement references.
//!
//! BB84 uses the two-valued [`Basis`] (computational `Z`, conjugate `X`).
//! E91 parameterises the measurement by a rotation [`Angle`] drawn from a small
//! per-party set. Both are plain `Copy` values compared by exact equality during
//! sifting.

use crate::core::errors::ConfigError;
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// BB84 encoding/measurement basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Computational basis {|0>, |1>}.
    Z,
    /// Conjugate (Hadamard) basis {|+>, |->}.
    X,
}

impl Basis {
    /// Both bases, in the order random choices are drawn from.
    pub const ALL: [Basis; 2] = [Basis::Z, Basis::X];
}

impl FromStr for Basis {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Z" | "z" => Ok(Basis::Z),
            "X" | "x" => Ok(Basis::X),
            other => Err(ConfigError::InvalidBasis(other.to_string())),
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Basis::Z => f.write_str("Z"),
            Basis::X => f.write_str("X"),
        }
    }
}

/// E91 measurement angle in radians.
///
/// Equality is exact value equality: `pi/4` and `9pi/4` are different angles
/// even though they describe the same physical rotation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Angle(f64);

impl Angle {
    /// Creates an angle, rejecting NaN and infinities.
    pub fn new(radians: f64) -> Result<Self, ConfigError> {
        if !radians.is_finite() {
            return Err(ConfigError::NonFiniteAngle(radians));
        }
        Ok(Self(radians))
    }

    pub fn radians(self) -> f64 {
        self.0
    }

    /// Parses every label of a set, failing on the first invalid one.
    pub fn parse_all<S: AsRef<str>>(labels: &[S]) -> Result<Vec<Angle>, ConfigError> {
        labels.iter().map(|l| l.as_ref().parse()).collect()
    }
}

/// Accepts plain radians (`0`, `0.7854`) or multiples of pi
/// (`pi`, `pi/4`, `3pi/8`, `-pi/8`, `3*pi/4`).
impl FromStr for Angle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidAngle(s.to_string());
        let label: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();

        if label.is_empty() {
            return Err(invalid());
        }

        let radians = match label.find("pi") {
            None => label.parse::<f64>().map_err(|_| invalid())?,
            Some(pos) => {
                let coefficient = &label[..pos];
                let coefficient = coefficient.strip_suffix('*').unwrap_or(coefficient);
                let numerator = match coefficient {
                    "" | "+" => 1.0,
                    "-" => -1.0,
                    c => c.parse::<f64>().map_err(|_| invalid())?,
                };

                let denominator = match &label[pos + 2..] {
                    "" => 1.0,
                    rest => rest
                        .strip_prefix('/')
                        .ok_or_else(invalid)?
                        .parse::<f64>()
                        .map_err(|_| invalid())?,
                };
                if denominator == 0.0 {
                    return Err(invalid());
                }

                numerator * PI / denominator
            }
        };

        Angle::new(radians)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}pi", self.0 / PI)
    }
}
