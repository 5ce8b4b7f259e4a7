//! # QState
//!
//! The amplitude vector: a complex-valued state over `2^n` basis states with
//! gate application, phase rotation and collapsing measurement. States are
//! value objects; verification paths clone before measuring.

use crate::complex::Complex;
use crate::errors::QuantumError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Numerical tolerance for unit-norm checks.
pub const NORM_TOLERANCE: f64 = 1e-10;

/// Upper bound on qubit count for dense vectors (2^20 amplitudes).
pub const MAX_QUBITS: usize = 20;

const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// A finite-dimensional complex amplitude vector.
///
/// Vectors whose length is not a power of two are zero-padded up to the next
/// power so qubit-indexed gates stay well-defined. Measurement outcomes are
/// recorded on the state in the order they were drawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QState {
    num_qubits: usize,
    amplitudes: Vec<Complex>,
    outcomes: Vec<bool>,
}

impl QState {
    /// Create `|0...0⟩` over `num_qubits` qubits.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::TooManyQubits`] above [`MAX_QUBITS`].
    pub fn new(num_qubits: usize) -> Result<Self, QuantumError> {
        if num_qubits > MAX_QUBITS {
            return Err(QuantumError::TooManyQubits(num_qubits));
        }
        let dimension = 1usize << num_qubits;
        let mut amplitudes = vec![Complex::ZERO; dimension];
        amplitudes[0] = Complex::ONE;
        Ok(Self {
            num_qubits,
            amplitudes,
            outcomes: Vec::new(),
        })
    }

    /// Wrap a raw amplitude vector without normalizing.
    ///
    /// Short vectors are zero-padded to the next power of two. The fraud
    /// path depends on the norm being preserved here, so no rescaling
    /// happens.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::EmptyState`] for an empty vector and
    /// [`QuantumError::TooManyQubits`] when the padded dimension exceeds
    /// `2^MAX_QUBITS`.
    pub fn from_amplitudes(mut amplitudes: Vec<Complex>) -> Result<Self, QuantumError> {
        if amplitudes.is_empty() {
            return Err(QuantumError::EmptyState);
        }
        let num_qubits = amplitudes.len().next_power_of_two().trailing_zeros() as usize;
        if num_qubits > MAX_QUBITS {
            return Err(QuantumError::TooManyQubits(num_qubits));
        }
        amplitudes.resize(1 << num_qubits, Complex::ZERO);
        Ok(Self {
            num_qubits,
            amplitudes,
            outcomes: Vec::new(),
        })
    }

    /// Encode classical bytes as a normalized state (amplitude = byte/255).
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::EmptyState`] for empty input, or
    /// [`QuantumError::ZeroNorm`] when every byte is zero.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, QuantumError> {
        let amplitudes = bytes
            .iter()
            .map(|&b| Complex::real(f64::from(b) / 255.0))
            .collect();
        let mut state = Self::from_amplitudes(amplitudes)?;
        state.normalize()?;
        Ok(state)
    }

    /// Number of qubits.
    #[must_use]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Vector dimension (`2^num_qubits`).
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.amplitudes.len()
    }

    /// Amplitude slice in basis order.
    #[must_use]
    pub fn amplitudes(&self) -> &[Complex] {
        &self.amplitudes
    }

    /// Recorded measurement outcomes, oldest first.
    #[must_use]
    pub fn outcomes(&self) -> &[bool] {
        &self.outcomes
    }

    /// Overwrite a single amplitude.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::AmplitudeOutOfRange`] past the dimension.
    pub fn set_amplitude(&mut self, index: usize, value: Complex) -> Result<(), QuantumError> {
        let dimension = self.dimension();
        let slot = self
            .amplitudes
            .get_mut(index)
            .ok_or(QuantumError::AmplitudeOutOfRange { index, dimension })?;
        *slot = value;
        Ok(())
    }

    /// L2 norm of the vector.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm_sq())
            .sum::<f64>()
            .sqrt()
    }

    /// True when the norm is 1 within [`NORM_TOLERANCE`].
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (self.norm() - 1.0).abs() < NORM_TOLERANCE
    }

    /// Rescale to unit norm.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::ZeroNorm`] when the norm is too small.
    pub fn normalize(&mut self) -> Result<(), QuantumError> {
        let norm = self.norm();
        if norm < 1e-300 {
            return Err(QuantumError::ZeroNorm(norm));
        }
        let inv = 1.0 / norm;
        for amplitude in &mut self.amplitudes {
            *amplitude = amplitude.scale(inv);
        }
        Ok(())
    }

    fn check_qubit(&self, qubit: usize) -> Result<(), QuantumError> {
        if qubit >= self.num_qubits {
            return Err(QuantumError::QubitOutOfRange {
                qubit,
                num_qubits: self.num_qubits,
            });
        }
        Ok(())
    }

    /// Apply an arbitrary single-qubit gate (2x2 complex matrix, row major).
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn apply_gate(&mut self, qubit: usize, gate: [[Complex; 2]; 2]) -> Result<(), QuantumError> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;
        for i in 0..self.amplitudes.len() {
            if i & mask == 0 {
                let j = i | mask;
                let a = self.amplitudes[i];
                let b = self.amplitudes[j];
                self.amplitudes[i] = gate[0][0] * a + gate[0][1] * b;
                self.amplitudes[j] = gate[1][0] * a + gate[1][1] * b;
            }
        }
        Ok(())
    }

    /// Apply the Hadamard gate to a qubit.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn apply_hadamard(&mut self, qubit: usize) -> Result<(), QuantumError> {
        let h = Complex::real(FRAC_1_SQRT_2);
        self.apply_gate(qubit, [[h, h], [h, -h]])
    }

    /// Apply the Pauli-X (NOT) gate to a qubit.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn apply_x(&mut self, qubit: usize) -> Result<(), QuantumError> {
        self.apply_gate(
            qubit,
            [[Complex::ZERO, Complex::ONE], [Complex::ONE, Complex::ZERO]],
        )
    }

    /// Multiply every `qubit = 1` amplitude by `e^{iθ}`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn apply_phase(&mut self, qubit: usize, angle: f64) -> Result<(), QuantumError> {
        self.apply_gate(
            qubit,
            [
                [Complex::ONE, Complex::ZERO],
                [Complex::ZERO, Complex::exp_i(angle)],
            ],
        )
    }

    /// Apply controlled-NOT: flip `target` wherever `control` is 1.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn apply_cnot(&mut self, control: usize, target: usize) -> Result<(), QuantumError> {
        self.check_qubit(control)?;
        self.check_qubit(target)?;
        let control_mask = 1usize << control;
        let target_mask = 1usize << target;
        for i in 0..self.amplitudes.len() {
            // Visit each swapped pair once (target bit clear).
            if i & control_mask != 0 && i & target_mask == 0 {
                let j = i | target_mask;
                self.amplitudes.swap(i, j);
            }
        }
        Ok(())
    }

    /// Probability of measuring `1` on a qubit.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn probability_one(&self, qubit: usize) -> Result<f64, QuantumError> {
        self.check_qubit(qubit)?;
        let mask = 1usize << qubit;
        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sq())
            .sum())
    }

    /// Measure a qubit: sample the outcome, collapse to the observed branch
    /// and renormalize. The outcome is also recorded on the state.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::QubitOutOfRange`] for a bad index.
    pub fn measure<R: Rng>(&mut self, qubit: usize, rng: &mut R) -> Result<bool, QuantumError> {
        let prob_one = self.probability_one(qubit)?;
        let outcome = rng.gen::<f64>() < prob_one;
        self.collapse(qubit, outcome, prob_one)?;
        self.outcomes.push(outcome);
        Ok(outcome)
    }

    /// Collapse a qubit to a known outcome and renormalize.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::ZeroNorm`] when the branch has no weight.
    pub fn collapse(
        &mut self,
        qubit: usize,
        outcome: bool,
        prob_one: f64,
    ) -> Result<(), QuantumError> {
        self.check_qubit(qubit)?;
        let branch_prob = if outcome { prob_one } else { 1.0 - prob_one };
        if branch_prob < 1e-300 {
            return Err(QuantumError::ZeroNorm(branch_prob));
        }
        let mask = 1usize << qubit;
        let factor = 1.0 / branch_prob.sqrt();
        for (i, amplitude) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) != outcome {
                *amplitude = Complex::ZERO;
            } else {
                *amplitude = amplitude.scale(factor);
            }
        }
        Ok(())
    }

    /// Sum of off-diagonal magnitudes of `|ψ⟩⟨ψ|`.
    ///
    /// Equals `(Σ|ψ_i|)² − Σ|ψ_i|²`, computed in linear time.
    #[must_use]
    pub fn coherence(&self) -> f64 {
        let sum_abs: f64 = self.amplitudes.iter().map(|a| a.abs()).sum();
        let sum_sq: f64 = self.amplitudes.iter().map(|a| a.norm_sq()).sum();
        sum_abs * sum_abs - sum_sq
    }

    /// Shannon entropy of the measurement distribution, in bits.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        self.amplitudes
            .iter()
            .map(|a| a.norm_sq())
            .filter(|&p| p > 0.0)
            .map(|p| -p * p.log2())
            .sum()
    }

    /// Fidelity `|⟨self|other⟩|²`.
    ///
    /// # Errors
    ///
    /// Returns [`QuantumError::DimensionMismatch`] for unequal dimensions.
    pub fn fidelity(&self, other: &QState) -> Result<f64, QuantumError> {
        if self.dimension() != other.dimension() {
            return Err(QuantumError::DimensionMismatch {
                left: self.dimension(),
                right: other.dimension(),
            });
        }
        let mut inner = Complex::ZERO;
        for (a, b) in self.amplitudes.iter().zip(other.amplitudes.iter()) {
            inner += a.conj() * *b;
        }
        Ok(inner.norm_sq())
    }

    /// Amplitude byte dump: little-endian IEEE-754 `(re, im)` per amplitude.
    #[must_use]
    pub fn to_amplitude_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.amplitudes.len() * 16);
        for amplitude in &self.amplitudes {
            out.extend_from_slice(&amplitude.re.to_le_bytes());
            out.extend_from_slice(&amplitude.im.to_le_bytes());
        }
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn uniform(num_qubits: usize) -> QState {
        let mut state = QState::new(num_qubits).unwrap();
        for q in 0..num_qubits {
            state.apply_hadamard(q).unwrap();
        }
        state
    }

    #[test]
    fn test_initial_state() {
        let state = QState::new(3).unwrap();
        assert_eq!(state.dimension(), 8);
        assert_eq!(state.amplitudes()[0], Complex::ONE);
        assert!(state.is_valid());
    }

    #[test]
    fn test_hadamard_superposition() {
        let mut state = QState::new(1).unwrap();
        state.apply_hadamard(0).unwrap();
        assert!((state.amplitudes()[0].re - FRAC_1_SQRT_2).abs() < NORM_TOLERANCE);
        assert!((state.amplitudes()[1].re - FRAC_1_SQRT_2).abs() < NORM_TOLERANCE);
        assert!(state.is_valid());
    }

    #[test]
    fn test_x_flips_basis_state() {
        let mut state = QState::new(2).unwrap();
        state.apply_x(1).unwrap();
        // |00> -> |10> (qubit 1 set => index 2)
        assert!((state.amplitudes()[2].re - 1.0).abs() < NORM_TOLERANCE);
    }

    #[test]
    fn test_cnot_entangles() {
        // H on control then CNOT gives the Bell state (|00> + |11>)/sqrt(2).
        let mut state = QState::new(2).unwrap();
        state.apply_hadamard(0).unwrap();
        state.apply_cnot(0, 1).unwrap();

        assert!((state.amplitudes()[0].re - FRAC_1_SQRT_2).abs() < NORM_TOLERANCE);
        assert!((state.amplitudes()[3].re - FRAC_1_SQRT_2).abs() < NORM_TOLERANCE);
        assert!(state.amplitudes()[1].abs() < NORM_TOLERANCE);
        assert!(state.amplitudes()[2].abs() < NORM_TOLERANCE);
    }

    #[test]
    fn test_phase_rotates_one_branch() {
        let mut state = uniform(1);
        state.apply_phase(0, std::f64::consts::PI).unwrap();
        // |1> amplitude picks up e^{iπ} = -1.
        assert!((state.amplitudes()[1].re + FRAC_1_SQRT_2).abs() < NORM_TOLERANCE);
        assert!(state.is_valid());
    }

    #[test]
    fn test_gates_preserve_norm() {
        let mut state = uniform(4);
        state.apply_phase(2, 1.234).unwrap();
        state.apply_cnot(0, 3).unwrap();
        state.apply_hadamard(1).unwrap();
        assert!(state.is_valid());
    }

    #[test]
    fn test_measurement_collapses_and_repeats() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = uniform(3);

        let first = state.measure(1, &mut rng).unwrap();
        assert!(state.is_valid());
        // Repeated measurement of a collapsed qubit is deterministic.
        for _ in 0..4 {
            assert_eq!(state.measure(1, &mut rng).unwrap(), first);
        }
        assert_eq!(state.outcomes().len(), 5);
    }

    #[test]
    fn test_measurement_reproducible_with_seed() {
        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = uniform(4);
            (0..8)
                .map(|i| state.measure(i % 4, &mut rng).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_qubit_out_of_range() {
        let mut state = QState::new(2).unwrap();
        assert!(matches!(
            state.apply_hadamard(2),
            Err(QuantumError::QubitOutOfRange { qubit: 2, .. })
        ));
    }

    #[test]
    fn test_from_bytes_normalizes_and_pads() {
        let state = QState::from_bytes(&[10, 20, 30]).unwrap();
        assert_eq!(state.dimension(), 4);
        assert!(state.is_valid());
        assert_eq!(state.amplitudes()[3], Complex::ZERO);
    }

    #[test]
    fn test_from_amplitudes_keeps_norm() {
        let state =
            QState::from_amplitudes(vec![Complex::real(3.0), Complex::real(4.0)]).unwrap();
        assert!((state.norm() - 5.0).abs() < NORM_TOLERANCE);
    }

    #[test]
    fn test_fidelity() {
        let a = uniform(3);
        let b = uniform(3);
        assert!((a.fidelity(&b).unwrap() - 1.0).abs() < NORM_TOLERANCE);

        let mut c = QState::new(3).unwrap();
        c.apply_x(0).unwrap();
        let zero = QState::new(3).unwrap();
        assert!(zero.fidelity(&c).unwrap() < NORM_TOLERANCE);
    }

    #[test]
    fn test_fidelity_dimension_mismatch() {
        let a = QState::new(2).unwrap();
        let b = QState::new(3).unwrap();
        assert!(matches!(
            a.fidelity(&b),
            Err(QuantumError::DimensionMismatch { left: 4, right: 8 })
        ));
    }

    #[test]
    fn test_entropy_extremes() {
        let basis = QState::new(3).unwrap();
        assert!(basis.entropy() < NORM_TOLERANCE);

        // Uniform over 8 states has 3 bits of entropy.
        let state = uniform(3);
        assert!((state.entropy() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_coherence_zero_for_basis_state() {
        let basis = QState::new(2).unwrap();
        assert!(basis.coherence() < NORM_TOLERANCE);
        assert!(uniform(2).coherence() > 1.0);
    }

    #[test]
    fn test_amplitude_bytes_layout() {
        let state = QState::new(1).unwrap();
        let bytes = state.to_amplitude_bytes();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..8], &1.0f64.to_le_bytes());
    }
}
