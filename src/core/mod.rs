pub mod basis;
pub mod errors;
mod measurements;
mod random;

pub use basis::{Angle, Basis};
pub use measurements::MeasurementModel;
pub use random::RandomSource;
