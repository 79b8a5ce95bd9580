//! BB84 Quantum Key Distribution Protocol.
//!
//! Alice encodes a random bit in a random basis (Z or X) and sends the qubit to
//! Bob, who measures it in his own random basis. With the eavesdropper enabled,
//! Eve intercepts every qubit, measures it in a random basis and resends a
//! fresh qubit encoding her outcome in her basis.

use super::{ChannelSimulator, Interception, ProtocolRun, TransmissionRecord, run_pipeline};
use crate::core::{Basis, MeasurementModel, RandomSource};
use crate::errors::ProtocolError;
use crate::estimator::ParameterEstimator;

/// BB84 results
pub type Bb84Result = ProtocolRun<Basis>;

/// A single qubit in flight: a bit encoded in a basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Qubit {
    bit: bool,
    basis: Basis,
}

impl Qubit {
    fn measure(self, model: &MeasurementModel, rng: &mut RandomSource, basis: Basis) -> bool {
        model.measure_qubit(rng, self.bit, self.basis, basis)
    }
}

/// BB84 channel with an optional intercept-resend attacker.
#[derive(Debug, Clone, Default)]
pub struct Bb84Channel {
    pub eavesdropper: bool,
    model: MeasurementModel,
}

impl Bb84Channel {
    pub fn new(eavesdropper: bool) -> Self {
        Self {
            eavesdropper,
            model: MeasurementModel,
        }
    }
}

impl ChannelSimulator for Bb84Channel {
    type Basis = Basis;

    fn transmit(&self, index: usize, rng: &mut RandomSource) -> TransmissionRecord<Basis> {
        // Alice prepares qubit
        let sender_bit = rng.random_bit();
        let sender_basis = rng.random_basis(&Basis::ALL);
        let mut qubit = Qubit {
            bit: sender_bit,
            basis: sender_basis,
        };

        // Eavesdropper intercepts, measures and resends
        let eavesdropper = if self.eavesdropper {
            let basis = rng.random_basis(&Basis::ALL);
            let bit = qubit.measure(&self.model, rng, basis);
            qubit = Qubit { bit, basis };
            Some(Interception { basis, bit })
        } else {
            None
        };

        // Bob measures
        let receiver_basis = rng.random_basis(&Basis::ALL);
        let receiver_bit = qubit.measure(&self.model, rng, receiver_basis);

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

/// Runs BB84 protocol
pub fn run(
    num_qubits: usize,
    eavesdropper: bool,
    estimator: &ParameterEstimator,
    rng: &mut RandomSource,
) -> Result<Bb84Result, ProtocolError> {
    run_pipeline(&Bb84Channel::new(eavesdropper), num_qubits, estimator, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::qkd::simulate_channel;

    #[test]
    fn test_records_are_indexed_in_order() {
        let mut rng = RandomSource::from_seed(20);
        let records = simulate_channel(&Bb84Channel::new(false), 64, &mut rng);
        assert_eq!(records.len(), 64);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.index, i);
            assert!(r.eavesdropper.is_none());
        }
    }

    #[test]
    fn test_matching_bases_agree_without_eve() {
        let mut rng = RandomSource::from_seed(21);
        let records = simulate_channel(&Bb84Channel::new(false), 1_000, &mut rng);
        for r in records.iter().filter(|r| r.bases_match()) {
            assert_eq!(r.sender_bit, r.receiver_bit, "index {}", r.index);
        }
    }

    #[test]
    fn test_eve_resends_her_own_outcome() {
        let mut rng = RandomSource::from_seed(22);
        let records = simulate_channel(&Bb84Channel::new(true), 1_000, &mut rng);
        for r in &records {
            let eve = r.eavesdropper.expect("eve intercepts every qubit");
            if eve.basis == r.sender_basis {
                assert_eq!(eve.bit, r.sender_bit);
            }
            if eve.basis == r.receiver_basis {
                assert_eq!(eve.bit, r.receiver_bit);
            }
        }
    }

    #[test]
    fn test_same_seed_same_transcript() {
        let channel = Bb84Channel::new(true);
        let a = simulate_channel(&channel, 100, &mut RandomSource::from_seed(23));
        let b = simulate_channel(&channel, 100, &mut RandomSource::from_seed(23));
        assert_eq!(a, b);
    }
}
