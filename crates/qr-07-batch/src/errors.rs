//! Error types for the batch processor.

use qr_03_state::StateError;
use thiserror::Error;

/// Errors surfaced to submitters.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Bounded input queue is full; retry later.
    #[error("backpressure: submission queue full")]
    BackpressureRejected,

    /// Submitted batch exceeds the configured size cap.
    #[error("batch too large: {len} > {max}")]
    BatchTooLarge {
        /// Submitted transaction count.
        len: usize,
        /// Configured cap.
        max: usize,
    },

    /// Processor has been stopped.
    #[error("processor stopped")]
    Stopped,

    /// Transaction application failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// Contract call target carries no code.
    #[error("no code at contract address")]
    NoContractCode,
}
