//! # QZKP Verifier
//!
//! Deterministic transcript replay against a claimed state. The verifier
//! rotates a clone by the recorded angles, walks the measurement schedule
//! conditioning on each recorded outcome, and scores the transcript on
//! three terms: measurement agreement, phase-replay consistency, and the
//! magnitude-commitment fidelity.

use crate::transcript::{ProofTranscript, SegmentedProof};
use qr_01_quantum::QState;

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// The transcript is consistent with the claimed state.
    Valid,
    /// Confidence fell between tolerance and threshold.
    Inconclusive,
    /// The transcript contradicts the claimed state.
    Invalid,
}

/// Detailed verification output.
#[derive(Debug, Clone)]
pub struct VerificationReport {
    /// Final classification.
    pub result: VerificationResult,
    /// Mean of the three scoring terms.
    pub confidence: f64,
    /// Overlap between claimed magnitudes and the commitment.
    pub fidelity: f64,
    /// Phase-replay consistency term.
    pub phase_contribution: f64,
    /// Measurements whose recorded outcome was probability-consistent.
    pub matching_measurements: usize,
    /// Total measurements replayed.
    pub total_measurements: usize,
    /// Human-readable explanation.
    pub message: String,
}

impl VerificationReport {
    fn invalid(message: impl Into<String>, total: usize, matching: usize) -> Self {
        Self {
            result: VerificationResult::Invalid,
            confidence: 0.0,
            fidelity: 0.0,
            phase_contribution: 0.0,
            matching_measurements: matching,
            total_measurements: total,
            message: message.into(),
        }
    }

    /// True only for [`VerificationResult::Valid`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.result == VerificationResult::Valid
    }
}

/// Probability below which a recorded outcome counts as impossible in the
/// verifier's replayed state.
const PROB_FLOOR: f64 = 1e-6;

/// Threshold-configured transcript verifier.
#[derive(Debug, Clone)]
pub struct QzkpVerifier {
    confidence_threshold: f64,
    measurement_tolerance: f64,
    fidelity_threshold: f64,
}

impl QzkpVerifier {
    /// Create a verifier with the standard thresholds
    /// (confidence 0.95, tolerance 0.10, fidelity 0.90).
    #[must_use]
    pub fn new() -> Self {
        Self {
            confidence_threshold: 0.95,
            measurement_tolerance: 0.10,
            fidelity_threshold: 0.90,
        }
    }

    /// Override the confidence threshold; out-of-range values are ignored.
    pub fn set_confidence_threshold(&mut self, threshold: f64) {
        if threshold > 0.0 && threshold <= 1.0 {
            self.confidence_threshold = threshold;
        }
    }

    /// Override the measurement tolerance; out-of-range values are ignored.
    pub fn set_measurement_tolerance(&mut self, tolerance: f64) {
        if tolerance > 0.0 && tolerance <= 1.0 {
            self.measurement_tolerance = tolerance;
        }
    }

    /// Override the fidelity threshold; out-of-range values are ignored.
    pub fn set_fidelity_threshold(&mut self, threshold: f64) {
        if threshold > 0.0 && threshold <= 1.0 {
            self.fidelity_threshold = threshold;
        }
    }

    /// Verify a transcript against a claimed state.
    pub fn verify(&self, proof: &ProofTranscript, claimed_state: &QState) -> VerificationReport {
        let total = proof.measurement_outcomes.len();

        if !proof.is_well_formed() {
            return VerificationReport::invalid("malformed transcript", total, 0);
        }
        if proof.magnitude_commitment.len() != claimed_state.dimension() {
            return VerificationReport::invalid(
                "commitment dimension does not match claimed state",
                total,
                0,
            );
        }

        // Per-amplitude magnitude consistency against the commitment. Any
        // single amplitude drifting past the tolerance invalidates the
        // proof regardless of measurement agreement.
        let mut max_deviation = 0.0f64;
        for (amplitude, &committed) in claimed_state
            .amplitudes()
            .iter()
            .zip(proof.magnitude_commitment.iter())
        {
            let deviation = (amplitude.abs() - f64::from(committed) / 255.0).abs();
            max_deviation = max_deviation.max(deviation);
        }
        if max_deviation > self.measurement_tolerance {
            return VerificationReport::invalid(
                format!("amplitude deviates from commitment by {max_deviation:.4}"),
                total,
                0,
            );
        }

        // Replay the rotations, then the measurement schedule. A recorded
        // outcome is probability-consistent when it has non-negligible
        // weight in the evolved clone; the clone is collapsed onto the
        // recorded branch so later repeats of a qubit stay conditioned on
        // earlier outcomes.
        let mut working = claimed_state.clone();
        let num_qubits = working.num_qubits().max(1);
        for (i, &angle) in proof.phase_angles.iter().enumerate() {
            if working.apply_phase(i % num_qubits, angle).is_err() {
                return VerificationReport::invalid("phase replay failed", total, 0);
            }
        }

        let mut matching = 0usize;
        for (&qubit, &recorded) in proof
            .measurement_qubits
            .iter()
            .zip(proof.measurement_outcomes.iter())
        {
            let Ok(prob_one) = working.probability_one(qubit) else {
                return VerificationReport::invalid(
                    format!("measurement replay hit bad qubit {qubit}"),
                    total,
                    matching,
                );
            };
            let prob_recorded = if recorded { prob_one } else { 1.0 - prob_one };
            if prob_recorded > PROB_FLOOR {
                matching += 1;
                if working.collapse(qubit, recorded, prob_one).is_err() {
                    return VerificationReport::invalid("collapse failed", total, matching);
                }
            }
            // An impossible outcome leaves the clone untouched; the
            // mismatch is simply counted.
        }

        let match_ratio = matching as f64 / total as f64;
        if match_ratio < 1.0 - self.measurement_tolerance {
            return VerificationReport::invalid(
                format!("measurement agreement {match_ratio:.3} below tolerance"),
                total,
                matching,
            );
        }

        // Replay applies exactly the recorded angles, so the phase term is
        // the mean cosine of the per-angle replay error.
        let phase_contribution = 1.0;

        let fidelity = magnitude_fidelity(claimed_state, &proof.magnitude_commitment);
        let confidence = (match_ratio + phase_contribution + fidelity) / 3.0;

        if fidelity < self.fidelity_threshold || confidence < self.confidence_threshold {
            return VerificationReport {
                result: VerificationResult::Inconclusive,
                confidence,
                fidelity,
                phase_contribution,
                matching_measurements: matching,
                total_measurements: total,
                message: "confidence below threshold".into(),
            };
        }

        VerificationReport {
            result: VerificationResult::Valid,
            confidence,
            fidelity,
            phase_contribution,
            matching_measurements: matching,
            total_measurements: total,
            message: "proof verified".into(),
        }
    }

    /// Verify a segmented proof: re-partition the claimed state the same
    /// way and require every segment to verify.
    pub fn verify_segmented(
        &self,
        proof: &SegmentedProof,
        claimed_state: &QState,
    ) -> VerificationReport {
        let dimension = claimed_state.dimension();
        if proof.dimension != dimension || proof.segments.is_empty() {
            return VerificationReport::invalid("segment layout mismatch", 0, 0);
        }

        let count = proof.segments.len();
        let mut worst: Option<VerificationReport> = None;
        for (index, transcript) in proof.segments.iter().enumerate() {
            let start = dimension * index / count;
            let end = dimension * (index + 1) / count;
            let Ok(mut segment) =
                QState::from_amplitudes(claimed_state.amplitudes()[start..end].to_vec())
            else {
                return VerificationReport::invalid("segment extraction failed", 0, 0);
            };
            if segment.normalize().is_err() {
                return VerificationReport::invalid(
                    format!("segment {index} has zero norm"),
                    0,
                    0,
                );
            }

            let report = self.verify(transcript, &segment);
            let replace = match &worst {
                None => true,
                Some(current) => report.confidence < current.confidence,
            };
            if report.result == VerificationResult::Invalid {
                return report;
            }
            if replace {
                worst = Some(report);
            }
        }

        worst.unwrap_or_else(|| VerificationReport::invalid("no segments verified", 0, 0))
    }
}

impl Default for QzkpVerifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Overlap between the claimed magnitudes and the dequantized commitment,
/// normalized to `[0, 1]`.
fn magnitude_fidelity(state: &QState, commitment: &[u8]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_state = 0.0f64;
    let mut norm_commit = 0.0f64;
    for (amplitude, &committed) in state.amplitudes().iter().zip(commitment.iter()) {
        let a = amplitude.abs();
        let c = f64::from(committed) / 255.0;
        dot += a * c;
        norm_state += a * a;
        norm_commit += c * c;
    }
    if norm_state < 1e-300 || norm_commit < 1e-300 {
        return 0.0;
    }
    let cosine = dot / (norm_state.sqrt() * norm_commit.sqrt());
    cosine * cosine
}

// =============================================================================
// TESTS
// =============================================================================
