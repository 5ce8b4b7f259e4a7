//! Error types for the rollup proof paths.

use qr_01_quantum::QuantumError;
use qr_02_zkp::ZkpError;
use qr_03_state::StateError;
use shared_crypto::CryptoError;
use shared_types::{Address, BatchError};
use thiserror::Error;

/// Errors from transition, fraud and exit operations.
#[derive(Debug, Error)]
pub enum RollupError {
    /// Batch structure or ordering violation.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// A transaction in the batch failed to apply.
    #[error("invalid transaction in batch: {0}")]
    InvalidTransaction(#[from] StateError),

    /// Amplitude-vector construction failed.
    #[error(transparent)]
    Quantum(#[from] QuantumError),

    /// Proof generation failed.
    #[error(transparent)]
    Zkp(#[from] ZkpError),

    /// QZKP transcript contradicted the claimed state.
    #[error("qzkp mismatch: {0}")]
    QzkpMismatch(String),

    /// QZKP confidence fell between tolerance and threshold.
    #[error("qzkp inconclusive: {0}")]
    QzkpInconclusive(String),

    /// Signing or signature verification failed.
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// Account required by the proof does not exist.
    #[error("unknown account {0}")]
    UnknownAccount(Address),

    /// Exit proof timestamp lies in the future.
    #[error("exit timestamp {timestamp} is in the future (now {now})")]
    TimestampInFuture {
        /// Claimed proof timestamp (ms).
        timestamp: u64,
        /// Verifier clock (ms).
        now: u64,
    },

    /// Exit proof state root does not match the recomputed encoding.
    #[error("exit state root mismatch")]
    ExitRootMismatch,

    /// Fraud-proof replay diverged before a verdict could be formed.
    #[error("fraud replay failed: {0}")]
    ReplayFailed(String),

    /// Embedded snapshot roots do not match the claimed roots.
    #[error("state root mismatch in fraud proof")]
    RootMismatch,
}
