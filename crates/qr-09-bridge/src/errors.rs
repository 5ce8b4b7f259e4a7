//! Error types for L1 interaction.

use thiserror::Error;

/// Errors from bridge operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The contract rejected a commitment.
    #[error("commitment rejected: {0}")]
    CommitmentRejected(String),

    /// The bridge is in emergency mode and refuses state updates.
    #[error("bridge is in emergency mode")]
    EmergencyMode,

    /// Withdrawal could not be matched to a commitment.
    #[error("unknown withdrawal")]
    UnknownWithdrawal,

    /// Transport failure talking to L1.
    #[error("bridge transport error: {0}")]
    Transport(String),
}
