mod core;
pub mod config;
pub mod distill;
pub mod estimator;
pub mod protocols;
pub mod sifting;
mod simulator;

pub use crate::config::{Protocol, SimulationConfig};
pub use crate::core::{Angle, Basis, MeasurementModel, RandomSource, errors};
pub use crate::estimator::{Decision, ParameterEstimator, QberEstimate};
pub use crate::protocols::qkd::{Interception, ProtocolRun, Summary, TransmissionRecord};
pub use crate::simulator::{QkdSimulator, SimulationOutcome};
