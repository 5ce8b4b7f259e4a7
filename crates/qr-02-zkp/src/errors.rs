//! Error types for proof generation and verification.

use qr_01_quantum::QuantumError;
use thiserror::Error;

/// Errors from the QZKP prover and verifier.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ZkpError {
    /// Underlying amplitude-vector operation failed.
    #[error("quantum state error: {0}")]
    State(#[from] QuantumError),

    /// Segment count must be at least 1 and at most the state dimension.
    #[error("invalid segment count {count} for dimension {dimension}")]
    InvalidSegmentCount { count: usize, dimension: usize },

    /// A segment carried no amplitude weight and cannot be proven.
    #[error("segment {0} has zero norm")]
    DegenerateSegment(usize),

    /// Parallel proving was cancelled between segments.
    #[error("proving cancelled")]
    Cancelled,
}
