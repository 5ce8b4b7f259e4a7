//! # Proof Transcripts
//!
//! The transcript binds the prover's state through three artifacts: the
//! measurement schedule, the recorded outcomes, and a quantized magnitude
//! commitment of the pre-rotation amplitudes. Phases are never revealed.

use serde::{Deserialize, Serialize};

/// A measurement transcript over a single amplitude vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofTranscript {
    /// Qubit indices measured, in order (drawn with replacement).
    pub measurement_qubits: Vec<usize>,
    /// Phase rotation angles applied before measurement.
    pub phase_angles: Vec<f64>,
    /// Outcome bit per entry of `measurement_qubits`.
    pub measurement_outcomes: Vec<bool>,
    /// Quantized magnitude per amplitude of the pre-rotation state
    /// (`round(|a_i| * 255)`); amplitude phases stay hidden.
    pub magnitude_commitment: Vec<u8>,
    /// Unix timestamp in milliseconds at proving time.
    pub timestamp: u64,
}

impl ProofTranscript {
    /// Structural validity: outcomes pair 1:1 with measured qubits and at
    /// least one measurement was taken.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.measurement_qubits.is_empty()
            && self.measurement_qubits.len() == self.measurement_outcomes.len()
            && !self.magnitude_commitment.is_empty()
    }

    /// Number of measurements in the transcript.
    #[must_use]
    pub fn len(&self) -> usize {
        self.measurement_qubits.len()
    }

    /// True when no measurements were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.measurement_qubits.is_empty()
    }
}

/// Concatenated transcripts from segmented-parallel proving.
///
/// Segment `i` covers the amplitude range `[offsets[i], offsets[i+1])` of
/// the full vector; the verifier re-partitions identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentedProof {
    /// Per-segment transcripts in segment order.
    pub segments: Vec<ProofTranscript>,
    /// Dimension of the full amplitude vector at proving time.
    pub dimension: usize,
}

impl SegmentedProof {
    /// Number of segments.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed() {
        let transcript = ProofTranscript {
            measurement_qubits: vec![0, 1],
            phase_angles: vec![0.5],
            measurement_outcomes: vec![true, false],
            magnitude_commitment: vec![255],
            timestamp: 1,
        };
        assert!(transcript.is_well_formed());
        assert_eq!(transcript.len(), 2);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let transcript = ProofTranscript {
            measurement_qubits: vec![0, 1],
            phase_angles: vec![],
            measurement_outcomes: vec![true],
            magnitude_commitment: vec![255],
            timestamp: 1,
        };
        assert!(!transcript.is_well_formed());
    }
}
