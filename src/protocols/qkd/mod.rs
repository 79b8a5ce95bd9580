//! Quantum Key Distribution (QKD) Protocols.
//!
//! This module contains the channel simulators of the two supported protocols:
//! - **BB84**: prepare-and-measure with Z/X bases.
//! - **E91**: entanglement-based with per-party rotation angles.
//!
//! Both produce one [`TransmissionRecord`] per index, which the sifting,
//! estimation and distillation stages consume unchanged.

pub mod bb84;
pub mod e91;

use crate::core::RandomSource;
use crate::distill::{self, DistilledKey};
use crate::errors::ProtocolError;
use crate::estimator::{ParameterEstimator, QberEstimate};
use crate::sifting::{self, SiftedSequence};
use std::fmt::Debug;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Eavesdropper's choice and outcome for one intercepted transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interception<B> {
    pub basis: B,
    pub bit: bool,
}

/// Everything that happened to a single transmission.
///
/// `B` is the measurement reference: [`Basis`](crate::Basis) for BB84,
/// [`Angle`](crate::Angle) for E91.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionRecord<B> {
    pub index: usize,
    /// Prepared bit (BB84) or measured bit (E91) on the sender side.
    pub sender_bit: bool,
    pub sender_basis: B,
    pub receiver_basis: B,
    pub receiver_bit: bool,
    pub eavesdropper: Option<Interception<B>>,
}

impl<B: PartialEq> TransmissionRecord<B> {
    /// Sender and receiver used the same reference.
    pub fn bases_match(&self) -> bool {
        self.sender_basis == self.receiver_basis
    }
}

/// A per-index transmission model.
///
/// Implementations must not keep state across indices: every random draw
/// comes from the `rng` handed to [`transmit`](ChannelSimulator::transmit).
pub trait ChannelSimulator: Sync {
    type Basis: Copy + PartialEq + Debug + Send;

    fn transmit(&self, index: usize, rng: &mut RandomSource) -> TransmissionRecord<Self::Basis>;
}

/// Simulates `count` transmissions, returned in index order.
///
/// One seed is drawn from `rng`; each index then runs on its own sub-stream, so
/// the records do not depend on whether the `parallel` feature is enabled.
pub fn simulate_channel<C: ChannelSimulator>(
    channel: &C,
    count: usize,
    rng: &mut RandomSource,
) -> Vec<TransmissionRecord<C::Basis>> {
    let stream_seed = rng.next_seed();

    #[cfg(feature = "parallel")]
    let records: Vec<_> = (0..count)
        .into_par_iter()
        .map(|i| channel.transmit(i, &mut RandomSource::substream(stream_seed, i)))
        .collect();

    #[cfg(not(feature = "parallel"))]
    let records: Vec<_> = (0..count)
        .map(|i| channel.transmit(i, &mut RandomSource::substream(stream_seed, i)))
        .collect();

    debug!(transmissions = records.len(), "channel simulation finished");
    records
}

/// Full-sifted statistics for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub transmissions: usize,
    pub intercepted: usize,
    pub sifted_length: usize,
    /// Mismatches over the whole sifted sequence, not only the sample.
    pub full_mismatches: usize,
    pub full_qber: f64,
}

/// Result of one protocol run.
#[derive(Debug, Clone)]
pub struct ProtocolRun<B> {
    pub records: Vec<TransmissionRecord<B>>,
    pub sifted: SiftedSequence,
    pub estimate: QberEstimate,
    /// `None` when the run aborted.
    pub key: Option<DistilledKey>,
    pub summary: Summary,
}

impl<B> ProtocolRun<B> {
    pub fn aborted(&self) -> bool {
        self.key.is_none()
    }
}

/// Channel → sifting → estimation → distillation.
pub fn run_pipeline<C: ChannelSimulator>(
    channel: &C,
    transmissions: usize,
    estimator: &ParameterEstimator,
    rng: &mut RandomSource,
) -> Result<ProtocolRun<C::Basis>, ProtocolError> {
    let records = simulate_channel(channel, transmissions, rng);
    let sifted = sifting::sift(&records);
    debug!(sifted_length = sifted.len(), "sifting finished");

    if sifted.is_empty() {
        return Err(ProtocolError::InsufficientData { transmissions });
    }
    let estimate = estimator.estimate(&sifted, rng)?;

    let key = distill::distill(&sifted, &estimate);

    let summary = Summary {
        transmissions,
        intercepted: records.iter().filter(|r| r.eavesdropper.is_some()).count(),
        sifted_length: sifted.len(),
        full_mismatches: sifted.mismatches(),
        full_qber: sifted.qber(),
    };

    Ok(ProtocolRun {
        records,
        sifted,
        estimate,
        key,
        summary,
    })
}
