//! # Hash-Ladder One-Time Signatures
//!
//! A Lamport-style hash-based scheme exposed through [`SignatureScheme`] to
//! prove the consensus stack is cryptosystem-agnostic. Parameter sets mirror
//! the Falcon lattice sizes: `N = 512` signs a 256-bit digest, `N = 1024`
//! signs a 512-bit digest, where `N` is the number of secret scalars.
//!
//! Keys are one-time: signing two distinct messages with the same key leaks
//! secret material. The node only uses this scheme in tests and for
//! single-shot exit proofs.

use crate::hashing::{blake3_derive_key, blake3_hash, blake3_xof};
use crate::scheme::{Keypair, SignatureScheme};
use crate::CryptoError;
use rand::RngCore;

const SCALAR_LEN: usize = 32;

/// Supported parameter sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LadderParam {
    /// 512 secret scalars; signs a 256-bit message digest.
    N512,
    /// 1024 secret scalars; signs a 512-bit message digest.
    N1024,
}

impl LadderParam {
    /// Number of secret scalars.
    pub fn n(&self) -> usize {
        match self {
            Self::N512 => 512,
            Self::N1024 => 1024,
        }
    }

    /// Message digest length in bytes (two scalars per digest bit).
    pub fn digest_len(&self) -> usize {
        self.n() / 16
    }

    /// Parse from a raw N value.
    pub fn from_n(n: usize) -> Result<Self, CryptoError> {
        match n {
            512 => Ok(Self::N512),
            1024 => Ok(Self::N1024),
            other => Err(CryptoError::UnsupportedParameter(other)),
        }
    }
}

/// Hash-ladder one-time signature scheme.
#[derive(Debug, Clone, Copy)]
pub struct HashLadderScheme {
    param: LadderParam,
}

impl HashLadderScheme {
    /// Create the scheme for a parameter set.
    pub fn new(param: LadderParam) -> Self {
        Self { param }
    }

    /// Expand a 32-byte seed into the i-th secret scalar.
    fn scalar(seed: &[u8; 32], index: usize) -> [u8; 32] {
        let mut material = [0u8; 40];
        material[..32].copy_from_slice(seed);
        material[32..].copy_from_slice(&(index as u64).to_le_bytes());
        blake3_derive_key("quantum-rollup ladder scalar", &material)
    }

    fn digest(&self, message: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; self.param.digest_len()];
        blake3_xof(message, &mut out);
        out
    }

    fn bit(digest: &[u8], i: usize) -> usize {
        ((digest[i / 8] >> (i % 8)) & 1) as usize
    }
}

impl SignatureScheme for HashLadderScheme {
    fn name(&self) -> &'static str {
        match self.param {
            LadderParam::N512 => "hash-ladder-512",
            LadderParam::N1024 => "hash-ladder-1024",
        }
    }

    fn generate_keypair(&self) -> Keypair {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        self.keypair_from_seed(seed)
    }

    fn keypair_from_seed(&self, seed: [u8; 32]) -> Keypair {
        // Public key is the hash of every secret scalar, in order.
        let n = self.param.n();
        let mut public = Vec::with_capacity(n * SCALAR_LEN);
        for i in 0..n {
            public.extend_from_slice(&blake3_hash(&Self::scalar(&seed, i)));
        }
        Keypair::new(public, seed.to_vec())
    }

    fn sign(&self, secret: &[u8], message: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let seed: [u8; 32] = secret
            .try_into()
            .map_err(|_| CryptoError::InvalidSecretKey)?;

        let digest = self.digest(message);
        let bits = self.param.n() / 2;

        // Reveal one of the two scalars per digest bit.
        let mut signature = Vec::with_capacity(bits * SCALAR_LEN);
        for i in 0..bits {
            let index = 2 * i + Self::bit(&digest, i);
            signature.extend_from_slice(&Self::scalar(&seed, index));
        }
        Ok(signature)
    }

    fn verify(&self, public: &[u8], message: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
        let n = self.param.n();
        if public.len() != n * SCALAR_LEN {
            return Err(CryptoError::InvalidPublicKey);
        }
        let bits = n / 2;
        let expected = bits * SCALAR_LEN;
        if signature.len() != expected {
            return Err(CryptoError::InvalidSignatureLength {
                expected,
                actual: signature.len(),
            });
        }

        let digest = self.digest(message);
        for i in 0..bits {
            let revealed = &signature[i * SCALAR_LEN..(i + 1) * SCALAR_LEN];
            let index = 2 * i + Self::bit(&digest, i);
            let committed = &public[index * SCALAR_LEN..(index + 1) * SCALAR_LEN];
            if blake3_hash(revealed) != *committed {
                return Err(CryptoError::VerificationFailed);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_both_params() {
        for param in [LadderParam::N512, LadderParam::N1024] {
            let scheme = HashLadderScheme::new(param);
            let keypair = scheme.keypair_from_seed([1u8; 32]);

            let sig = scheme.sign(&keypair.secret, b"exit proof message").unwrap();
            assert!(scheme
                .verify(&keypair.public, b"exit proof message", &sig)
                .is_ok());
        }
    }

    #[test]
    fn test_tampered_message_rejected() {
        let scheme = HashLadderScheme::new(LadderParam::N512);
        let keypair = scheme.keypair_from_seed([2u8; 32]);

        let sig = scheme.sign(&keypair.secret, b"original").unwrap();
        assert_eq!(
            scheme.verify(&keypair.public, b"tampered", &sig),
            Err(CryptoError::VerificationFailed)
        );
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let scheme = HashLadderScheme::new(LadderParam::N512);
        let keypair = scheme.keypair_from_seed([3u8; 32]);

        let mut sig = scheme.sign(&keypair.secret, b"message").unwrap();
        sig[0] ^= 0xFF;
        assert!(scheme.verify(&keypair.public, b"message", &sig).is_err());
    }

    #[test]
    fn test_key_sizes() {
        let scheme = HashLadderScheme::new(LadderParam::N512);
        let keypair = scheme.keypair_from_seed([4u8; 32]);
        assert_eq!(keypair.public.len(), 512 * 32);

        let sig = scheme.sign(&keypair.secret, b"m").unwrap();
        assert_eq!(sig.len(), 256 * 32);
    }

    #[test]
    fn test_param_from_n() {
        assert_eq!(LadderParam::from_n(512).unwrap(), LadderParam::N512);
        assert_eq!(LadderParam::from_n(1024).unwrap(), LadderParam::N1024);
        assert!(LadderParam::from_n(256).is_err());
    }
}
