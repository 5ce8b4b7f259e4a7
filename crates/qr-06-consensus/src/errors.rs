//! Error types for the consensus engine.

use thiserror::Error;

/// Errors from POBPC operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Bounded transaction queue is full.
    #[error("transaction queue full")]
    QueueFull,

    /// No transactions were available to batch.
    #[error("no transactions queued")]
    EmptyBatch,

    /// Node is degraded and refuses to produce batches.
    #[error("consensus engine degraded: {0}")]
    Degraded(String),

    /// Proof failed structural validation.
    #[error("invalid batch proof structure: {0}")]
    StructureInvalid(String),

    /// Re-derived batch hash does not match the proof.
    #[error("batch hash mismatch")]
    HashMismatch,

    /// Quantum proof replay failed.
    #[error("quantum proof invalid: {0}")]
    QuantumProofInvalid(String),

    /// Too few valid witness signatures.
    #[error("consensus not reached: {valid} valid of {required} required")]
    ConsensusNotReached {
        /// Signatures that verified.
        valid: usize,
        /// `⌈W·τ⌉` signatures needed.
        required: usize,
    },

    /// Vote referenced an unregistered witness.
    #[error("unknown witness {0}")]
    UnknownWitness(String),

    /// Witness id or key was empty at registration.
    #[error("invalid witness registration")]
    InvalidRegistration,

    /// Vote arrived after the per-batch deadline.
    #[error("vote deadline expired")]
    VoteDeadlineExpired,

    /// Error-correction recovery could not restore the state.
    #[error("quantum state recovery failed")]
    RecoveryFailed,
}
