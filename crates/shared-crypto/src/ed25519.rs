//! # Ed25519 Signature Scheme
//!
//! Twisted Edwards curve signatures with deterministic nonces. The default
//! scheme for account and witness signatures.

use crate::scheme::{Keypair, SignatureScheme};
use crate::CryptoError;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};

/// Ed25519 signature scheme (32-byte keys, 64-byte signatures).
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Scheme;

impl Ed25519Scheme {
    /// Create the scheme.
    pub fn new() -> Self {
        Self
    }
}

impl SignatureScheme for Ed25519Scheme {
    fn name(&self) -> &'static str {
        "ed25519"
    }

    fn generate_keypair(&self) -> Keypair {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        Keypair::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            signing_key.to_bytes().to_vec(),
        )
    }

    fn keypair_from_seed(&self, seed: [u8; 32]) -> Keypair {
        let signing_key = SigningKey::from_bytes(&seed);
        Keypair::new(
            signing_key.verifying_key().to_bytes().to_vec(),
            signing_key.to_bytes().to_vec(),
        )
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let seed: [u8; 32] = secret
            .try_into()
            .map_err(|_| CryptoError::InvalidSecretKey)?;
        let signing_key = SigningKey::from_bytes(&seed);
        Ok(signing_key.sign(message).to_bytes().to_vec())
    }

    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let pk_bytes: [u8; 32] = public
            .try_into()
            .map_err(|_| CryptoError::InvalidPublicKey)?;
        let verifying_key =
            VerifyingKey::from_bytes(&pk_bytes).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig_bytes: [u8; 64] =
            signature
                .try_into()
                .map_err(|_| CryptoError::InvalidSignatureLength {
                    expected: 64,
                    actual: signature.len(),
                })?;
        let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let scheme = Ed25519Scheme::new();
        let keypair = scheme.generate_keypair();
        let message = b"Hello, Ed25519!";

        let signature = scheme.sign(&keypair.secret, message).unwrap();
        assert!(scheme.verify(&keypair.public, message, &signature).is_ok());
    }

    #[test]
    fn test_wrong_key_fails() {
        let scheme = Ed25519Scheme::new();
        let kp1 = scheme.generate_keypair();
        let kp2 = scheme.generate_keypair();

        let signature = scheme.sign(&kp1.secret, b"test").unwrap();
        assert!(scheme.verify(&kp2.public, b"test", &signature).is_err());
    }

    #[test]
    fn test_deterministic_signatures() {
        let scheme = Ed25519Scheme::new();
        let keypair = scheme.keypair_from_seed([0xAB; 32]);

        let sig1 = scheme.sign(&keypair.secret, b"deterministic").unwrap();
        let sig2 = scheme.sign(&keypair.secret, b"deterministic").unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_seed_roundtrip() {
        let scheme = Ed25519Scheme::new();
        let kp1 = scheme.keypair_from_seed([3u8; 32]);
        let kp2 = scheme.keypair_from_seed([3u8; 32]);
        assert_eq!(kp1.public, kp2.public);
    }
}
