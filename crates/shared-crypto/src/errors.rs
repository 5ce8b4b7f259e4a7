//! Error types for cryptographic operations.

use thiserror::Error;

/// Errors from hashing and signature operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Public key bytes failed validation.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// Secret key bytes failed validation.
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Signature bytes have the wrong length for the scheme.
    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    /// Signature did not verify against the message and key.
    #[error("signature verification failed")]
    VerificationFailed,

    /// Unsupported scheme parameter.
    #[error("unsupported parameter N={0}, supported values are 512 and 1024")]
    UnsupportedParameter(usize),
}
