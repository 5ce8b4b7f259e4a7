//! # Error Types
//!
//! Transaction, batch and wire-format error kinds shared across subsystems.
//! Each kind is distinguishable by callers and verifiers.

use thiserror::Error;

/// Transaction-level validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransactionError {
    /// Signature does not verify the transaction hash under the sender key.
    #[error("invalid signature")]
    InvalidSignature,

    /// Nonce is not exactly one past the sender account nonce.
    #[error("invalid nonce: expected {expected}, got {got}")]
    InvalidNonce { expected: u64, got: u64 },

    /// Sender balance cannot cover amount plus gas.
    #[error("insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u64, available: u64 },

    /// Sender account does not exist.
    #[error("unknown sender")]
    UnknownSender,
}

/// Batch-level validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// Batch contains no transactions.
    #[error("batch is empty")]
    Empty,

    /// Batch exceeds the configured maximum size.
    #[error("batch too large: {len} > {max}")]
    TooLarge { len: usize, max: usize },

    /// Transactions violate the canonical batch ordering.
    #[error("batch misordered at index {index}")]
    Misordered { index: usize },
}

/// Canonical wire-format decoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Input ended before the declared length.
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },

    /// Input has bytes past the last field.
    #[error("trailing bytes after decoding: {remaining}")]
    TrailingBytes { remaining: usize },

    /// A declared length does not fit in memory bounds.
    #[error("declared length {len} exceeds limit {limit}")]
    LengthOverflow { len: usize, limit: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TransactionError::InvalidNonce {
            expected: 2,
            got: 5,
        };
        assert_eq!(err.to_string(), "invalid nonce: expected 2, got 5");

        let err = BatchError::TooLarge { len: 1001, max: 1000 };
        assert_eq!(err.to_string(), "batch too large: 1001 > 1000");
    }
}
