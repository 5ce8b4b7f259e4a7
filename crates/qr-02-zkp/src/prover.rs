//! # QZKP Prover
//!
//! Phase-rotate-and-measure transcript generation. Each prover carries its
//! own seeded RNG; there is no process-wide randomness.

use crate::errors::ZkpError;
use crate::transcript::{ProofTranscript, SegmentedProof};
use qr_01_quantum::QState;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Default phase-angle schedule length and values.
pub const DEFAULT_PHASE_ANGLES: [f64; 4] = [0.0, FRAC_PI_4, FRAC_PI_2, 3.0 * FRAC_PI_4];

/// Default number of measurements per transcript.
pub const DEFAULT_MEASUREMENT_QUBITS: usize = 8;

/// Transcript generator over amplitude vectors.
pub struct QzkpProver {
    optimal_phase_angles: Vec<f64>,
    optimal_measurement_qubits: usize,
    rng: StdRng,
}

impl QzkpProver {
    /// Create a prover seeded from system entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(rand::thread_rng().next_u64())
    }

    /// Create a prover with a fixed seed (reproducible transcripts).
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            optimal_phase_angles: DEFAULT_PHASE_ANGLES.to_vec(),
            optimal_measurement_qubits: DEFAULT_MEASUREMENT_QUBITS,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Replace the proving parameters. Empty angle lists and a zero qubit
    /// count are ignored.
    pub fn update_optimal_parameters(&mut self, phase_angles: Vec<f64>, measurement_qubits: usize) {
        if phase_angles.is_empty() || measurement_qubits == 0 {
            return;
        }
        self.optimal_phase_angles = phase_angles;
        self.optimal_measurement_qubits = measurement_qubits;
    }

    /// Configured phase-angle schedule.
    #[must_use]
    pub fn optimal_phase_angles(&self) -> &[f64] {
        &self.optimal_phase_angles
    }

    /// Configured measurement count.
    #[must_use]
    pub fn optimal_measurement_qubits(&self) -> usize {
        self.optimal_measurement_qubits
    }

    /// Generate a transcript for a state.
    ///
    /// Draws `m` measurement indices with replacement, `k` fresh angles in
    /// `[0, 2π)`, rotates a clone, measures, and commits the pre-rotation
    /// magnitudes.
    ///
    /// # Errors
    ///
    /// Returns [`ZkpError::State`] when the state rejects an operation.
    pub fn prove(&mut self, state: &QState) -> Result<ProofTranscript, ZkpError> {
        let num_qubits = state.num_qubits().max(1);

        let measurement_qubits: Vec<usize> = (0..self.optimal_measurement_qubits)
            .map(|_| self.rng.gen_range(0..num_qubits))
            .collect();
        let phase_angles: Vec<f64> = (0..self.optimal_phase_angles.len())
            .map(|_| self.rng.gen_range(0.0..2.0 * PI))
            .collect();

        let magnitude_commitment = quantize_magnitudes(state);

        let mut working = state.clone();
        for (i, &angle) in phase_angles.iter().enumerate() {
            working.apply_phase(i % num_qubits, angle)?;
        }

        let mut measurement_outcomes = Vec::with_capacity(measurement_qubits.len());
        for &qubit in &measurement_qubits {
            measurement_outcomes.push(working.measure(qubit, &mut self.rng)?);
        }

        Ok(ProofTranscript {
            measurement_qubits,
            phase_angles,
            measurement_outcomes,
            magnitude_commitment,
            timestamp: now_ms(),
        })
    }

    /// Segmented-parallel proving: partition the amplitude vector into
    /// `segment_count` contiguous ranges and prove each independently.
    ///
    /// Cancellation is cooperative between segments via `cancel`.
    ///
    /// # Errors
    ///
    /// Returns [`ZkpError::InvalidSegmentCount`], [`ZkpError::Cancelled`],
    /// or [`ZkpError::DegenerateSegment`] for an all-zero range.
    pub fn prove_parallel(
        &mut self,
        state: &QState,
        segment_count: usize,
        cancel: &AtomicBool,
    ) -> Result<SegmentedProof, ZkpError> {
        let dimension = state.dimension();
        if segment_count == 0 || segment_count > dimension {
            return Err(ZkpError::InvalidSegmentCount {
                count: segment_count,
                dimension,
            });
        }

        let phase_angles = self.optimal_phase_angles.clone();
        let measurement_qubits = self.optimal_measurement_qubits;
        let base_seed = self.rng.next_u64();

        let segments: Result<Vec<ProofTranscript>, ZkpError> = (0..segment_count)
            .into_par_iter()
            .map(|index| {
                if cancel.load(Ordering::Relaxed) {
                    return Err(ZkpError::Cancelled);
                }
                let start = dimension * index / segment_count;
                let end = dimension * (index + 1) / segment_count;
                let mut segment =
                    QState::from_amplitudes(state.amplitudes()[start..end].to_vec())?;
                segment
                    .normalize()
                    .map_err(|_| ZkpError::DegenerateSegment(index))?;

                let mut prover = QzkpProver::with_seed(base_seed.wrapping_add(index as u64));
                prover.update_optimal_parameters(phase_angles.clone(), measurement_qubits);
                prover.prove(&segment)
            })
            .collect();

        Ok(SegmentedProof {
            segments: segments?,
            dimension,
        })
    }
}

impl Default for QzkpProver {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantize amplitude magnitudes to one byte each.
#[must_use]
pub fn quantize_magnitudes(state: &QState) -> Vec<u8> {
    state
        .amplitudes()
        .iter()
        .map(|a| (a.abs().clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
