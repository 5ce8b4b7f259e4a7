//! Error types for state-store operations.

use shared_types::{Address, TransactionError};
use thiserror::Error;

/// Errors from [`crate::StateStore`] operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Transaction failed validation.
    #[error(transparent)]
    Transaction(#[from] TransactionError),

    /// No account exists at the address.
    #[error("unknown account {0}")]
    UnknownAccount(Address),

    /// Contract code is write-once.
    #[error("code already deployed at {0}")]
    CodeAlreadySet(Address),

    /// Nonces never decrease.
    #[error("nonce regression for {address}: {current} -> {requested}")]
    NonceRegression {
        /// Account whose nonce was pushed backwards.
        address: Address,
        /// Nonce currently stored.
        current: u64,
        /// Rejected lower value.
        requested: u64,
    },
}
