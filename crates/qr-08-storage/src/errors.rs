//! Error types for persistence.

use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying filesystem failure.
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    /// Another process holds the data directory.
    #[error("data directory is locked by another process")]
    Locked,

    /// Stored bytes failed to decode.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}
