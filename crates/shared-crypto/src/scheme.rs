//! # Signature Scheme Interface
//!
//! Consensus and rollup logic never name a concrete cryptosystem; they hold
//! a `dyn SignatureScheme` so schemes can be swapped without touching the
//! callers.

use crate::CryptoError;
use zeroize::Zeroizing;

/// A keypair produced by a [`SignatureScheme`].
///
/// Secret bytes are zeroized on drop.
pub struct Keypair {
    /// Public key bytes (scheme-defined length).
    pub public: Vec<u8>,
    /// Secret key bytes (scheme-defined length).
    pub secret: Zeroizing<Vec<u8>>,
}

impl Keypair {
    /// Construct from raw parts.
    pub fn new(public: Vec<u8>, secret: Vec<u8>) -> Self {
        Self {
            public,
            secret: Zeroizing::new(secret),
        }
    }
}

/// Capability interface for digital signatures.
///
/// Implementations must be deterministic in `sign` for a fixed key and
/// message, so witness votes over the same batch hash are reproducible.
pub trait SignatureScheme: Send + Sync {
    /// Human-readable scheme name.
    fn name(&self) -> &'static str;

    /// Generate a fresh keypair.
    fn generate_keypair(&self) -> Keypair;

    /// Derive a keypair from a 32-byte seed (reproducible identities).
    fn keypair_from_seed(&self, seed: [u8; 32]) -> Keypair;

    /// Sign a message with the secret key.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidSecretKey`] if the secret bytes do not
    /// decode for this scheme.
    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Verify a signature against a public key and message.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::VerificationFailed`] on mismatch, or a decode
    /// error for malformed keys/signatures.
    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError>;
}
