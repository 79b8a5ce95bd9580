//! Closed-form measurement statistics.
//!
//! Only three measurement situations ever occur in BB84 and E91, and each has
//! a simple probability law. Sampling those laws directly replaces a
//! general state-vector simulation.

use crate::core::basis::{Angle, Basis};
use crate::core::random::RandomSource;

/// Stateless sampler for the measurement outcomes used by the protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeasurementModel;

impl MeasurementModel {
    /// Measures a bit prepared in `prepared` basis using `measured` basis.
    ///
    /// Matching bases return the encoded bit; conjugate bases return a uniform
    /// bit independent of the encoding.
    pub fn measure_qubit(
        &self,
        rng: &mut RandomSource,
        bit: bool,
        prepared: Basis,
        measured: Basis,
    ) -> bool {
        if prepared == measured {
            bit
        } else {
            rng.random_bit()
        }
    }

    /// Joint measurement of a maximally entangled pair at `sender` and
    /// `receiver` angles.
    ///
    /// Outcomes agree with probability cos²(θa − θb): equal angles are
    /// perfectly correlated and each marginal is uniform.
    pub fn measure_entangled_pair(
        &self,
        rng: &mut RandomSource,
        sender: Angle,
        receiver: Angle,
    ) -> (bool, bool) {
        let sender_bit = rng.random_bit();
        if sender == receiver {
            return (sender_bit, sender_bit);
        }

        let p_same = (sender.radians() - receiver.radians()).cos().powi(2);
        let receiver_bit = if rng.random_event(p_same) {
            sender_bit
        } else {
            !sender_bit
        };
        (sender_bit, receiver_bit)
    }

    /// Measures one half of a maximally entangled pair on its own.
    ///
    /// The reduced state is maximally mixed, so the outcome is uniform whatever
    /// the angle.
    pub fn measure_entangled_half(&self, rng: &mut RandomSource, _angle: Angle) -> bool {
        rng.random_bit()
    }

    /// Measures the definite state |`state`> after a rotation by `angle`.
    pub fn measure_rotated(&self, rng: &mut RandomSource, state: bool, angle: Angle) -> bool {
        rng.random_event(Self::rotated_one_probability(state, angle))
    }

    /// Probability of outcome 1 for |`state`> measured at `angle`:
    /// sin²θ for |0>, cos²θ for |1>.
    pub fn rotated_one_probability(state: bool, angle: Angle) -> f64 {
        let theta = angle.radians();
        if state {
            theta.cos().powi(2)
        } else {
            theta.sin().powi(2)
        }
    }
}
