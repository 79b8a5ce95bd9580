//! E91 Quantum Key Distribution Protocol.
//!
//! A source distributes maximally entangled pairs to Alice and Bob, who measure
//! their halves after rotating by angles drawn from their own small sets. Only
//! pairs measured at exactly equal angles are kept.
//!
//! With the eavesdropper enabled, Eve measures Bob's half at a random angle and
//! then re-prepares the pair register: Bob's half is set to her outcome and
//! Alice's half is reset to |0>. Resetting Alice's half has no physical
//! counterpart (Eve never touches it) and is kept only to reproduce the
//! reference scenario.

use super::{ChannelSimulator, Interception, ProtocolRun, TransmissionRecord, run_pipeline};
use crate::core::errors::ConfigError;
use crate::core::{Angle, MeasurementModel, RandomSource};
use crate::errors::ProtocolError;
use crate::estimator::ParameterEstimator;
use std::f64::consts::PI;

/// E91 results
pub type E91Result = ProtocolRun<Angle>;

pub const DEFAULT_SENDER_ANGLES: [f64; 3] = [0.0, PI / 4.0, PI / 2.0];
pub const DEFAULT_RECEIVER_ANGLES: [f64; 3] = [PI / 4.0, PI / 2.0, 3.0 * PI / 4.0];
pub const DEFAULT_EAVESDROPPER_ANGLES: [f64; 3] = [0.0, PI / 4.0, PI / 2.0];

/// Angle sets each party draws from.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleChoices {
    sender: Vec<Angle>,
    receiver: Vec<Angle>,
    eavesdropper: Vec<Angle>,
}

impl AngleChoices {
    pub fn new(
        sender: Vec<Angle>,
        receiver: Vec<Angle>,
        eavesdropper: Vec<Angle>,
    ) -> Result<Self, ConfigError> {
        if sender.is_empty() {
            return Err(ConfigError::EmptyAngleSet("sender"));
        }
        if receiver.is_empty() {
            return Err(ConfigError::EmptyAngleSet("receiver"));
        }
        if eavesdropper.is_empty() {
            return Err(ConfigError::EmptyAngleSet("eavesdropper"));
        }
        Ok(Self {
            sender,
            receiver,
            eavesdropper,
        })
    }

    pub fn sender(&self) -> &[Angle] {
        &self.sender
    }

    pub fn receiver(&self) -> &[Angle] {
        &self.receiver
    }

    pub fn eavesdropper(&self) -> &[Angle] {
        &self.eavesdropper
    }
}

impl Default for AngleChoices {
    fn default() -> Self {
        let angles = |set: &[f64]| -> Vec<Angle> {
            set.iter().filter_map(|&r| Angle::new(r).ok()).collect()
        };
        Self {
            sender: angles(&DEFAULT_SENDER_ANGLES),
            receiver: angles(&DEFAULT_RECEIVER_ANGLES),
            eavesdropper: angles(&DEFAULT_EAVESDROPPER_ANGLES),
        }
    }
}

/// Two-qubit register shared by Alice and Bob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairState {
    /// Maximally entangled pair straight from the source.
    Entangled,
    /// Definite product state |sender, receiver>.
    Product { sender: bool, receiver: bool },
}

impl PairState {
    fn measure(
        self,
        model: &MeasurementModel,
        rng: &mut RandomSource,
        sender: Angle,
        receiver: Angle,
    ) -> (bool, bool) {
        match self {
            PairState::Entangled => model.measure_entangled_pair(rng, sender, receiver),
            PairState::Product {
                sender: s,
                receiver: r,
            } => (
                model.measure_rotated(rng, s, sender),
                model.measure_rotated(rng, r, receiver),
            ),
        }
    }
}

/// E91 channel with an optional intercept-resend attacker.
#[derive(Debug, Clone, Default)]
pub struct E91Channel {
    pub eavesdropper: bool,
    angles: AngleChoices,
    model: MeasurementModel,
}

impl E91Channel {
    pub fn new(eavesdropper: bool, angles: AngleChoices) -> Self {
        Self {
            eavesdropper,
            angles,
            model: MeasurementModel,
        }
    }

    pub fn angles(&self) -> &AngleChoices {
        &self.angles
    }
}

impl ChannelSimulator for E91Channel {
    type Basis = Angle;

    fn transmit(&self, index: usize, rng: &mut RandomSource) -> TransmissionRecord<Angle> {
        let sender_basis = rng.random_basis(&self.angles.sender);
        let receiver_basis = rng.random_basis(&self.angles.receiver);

        let mut pair = PairState::Entangled;

        // Eavesdropper measures Bob's half, then re-prepares the whole register
        let eavesdropper = if self.eavesdropper {
            let basis = rng.random_basis(&self.angles.eavesdropper);
            let bit = self.model.measure_entangled_half(rng, basis);
            pair = PairState::Product {
                sender: false,
                receiver: bit,
            };
            Some(Interception { basis, bit })
        } else {
            None
        };

        let (sender_bit, receiver_bit) =
            pair.measure(&self.model, rng, sender_basis, receiver_basis);

        TransmissionRecord {
            index,
            sender_bit,
            sender_basis,
            receiver_basis,
            receiver_bit,
            eavesdropper,
        }
    }
}

/// Runs E91 protocol
pub fn run(
    num_pairs: usize,
    eavesdropper: bool,
    angles: AngleChoices,
    estimator: &ParameterEstimator,
    rng: &mut RandomSource,
) -> Result<E91Result, ProtocolError> {
    run_pipeline(
        &E91Channel::new(eavesdropper, angles),
        num_pairs,
        estimator,
        rng,
    )
}
