//! Error types for amplitude-vector operations.

use thiserror::Error;

/// Errors from [`crate::QState`] operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QuantumError {
    /// Qubit index beyond the state's qubit count.
    #[error("qubit index {qubit} out of range for {num_qubits} qubits")]
    QubitOutOfRange { qubit: usize, num_qubits: usize },

    /// Amplitude index beyond the state dimension.
    #[error("amplitude index {index} out of range for dimension {dimension}")]
    AmplitudeOutOfRange { index: usize, dimension: usize },

    /// Two states have different dimensions where equal ones are required.
    #[error("dimension mismatch: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    /// Construction from an empty amplitude vector.
    #[error("state vector is empty")]
    EmptyState,

    /// Qubit count would overflow the addressable dimension.
    #[error("qubit count {0} exceeds dense-vector maximum")]
    TooManyQubits(usize),

    /// The vector norm is too small to renormalize.
    #[error("state norm {0} too small to normalize")]
    ZeroNorm(f64),
}
