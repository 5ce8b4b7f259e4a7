//! # BLAKE3 Hashing
//!
//! All state roots, transaction hashes and batch commitments in the rollup
//! are 256-bit BLAKE3 digests.

use blake3::Hasher;

/// BLAKE3 hash output (256-bit).
pub type Hash = [u8; 32];

/// Stateful BLAKE3 hasher.
pub struct Blake3Hasher {
    inner: Hasher,
}

impl Blake3Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Hasher::new(),
        }
    }

    /// Create keyed hasher (for MAC-style digests).
    pub fn new_keyed(key: &[u8; 32]) -> Self {
        Self {
            inner: Hasher::new_keyed(key),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(&self) -> Hash {
        let hash = self.inner.finalize();
        *hash.as_bytes()
    }

    /// Reset hasher for reuse.
    pub fn reset(&mut self) {
        self.inner.reset();
    }
}

impl Default for Blake3Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with BLAKE3 (one-shot).
pub fn blake3_hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple inputs as one stream.
pub fn blake3_hash_many(inputs: &[&[u8]]) -> Hash {
    let mut hasher = Blake3Hasher::new();
    for input in inputs {
        hasher.update(input);
    }
    hasher.finalize()
}

/// Keyed hash (MAC).
pub fn blake3_keyed_hash(key: &[u8; 32], data: &[u8]) -> Hash {
    *blake3::keyed_hash(key, data).as_bytes()
}

/// Derive a 32-byte key from a context string and input key material.
pub fn blake3_derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    *hasher.finalize().as_bytes()
}

/// Extended output: fill `out` with BLAKE3 XOF bytes of `data`.
pub fn blake3_xof(data: &[u8], out: &mut [u8]) {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    hasher.finalize_xof().fill(out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let h1 = blake3_hash(b"test");
        let h2 = blake3_hash(b"test");
        assert_eq!(h1, h2);
    }

    #[test]
    fn test_different_inputs() {
        let h1 = blake3_hash(b"input1");
        let h2 = blake3_hash(b"input2");
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_streaming_matches_oneshot() {
        let oneshot = blake3_hash(b"hello world");

        let mut hasher = Blake3Hasher::new();
        hasher.update(b"hello ");
        hasher.update(b"world");

        assert_eq!(oneshot, hasher.finalize());
    }

    #[test]
    fn test_keyed_hash_depends_on_key() {
        let h1 = blake3_keyed_hash(&[0xABu8; 32], b"data");
        let h2 = blake3_keyed_hash(&[0xABu8; 32], b"data");
        let h3 = blake3_keyed_hash(&[0xCDu8; 32], b"data");

        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }

    #[test]
    fn test_xof_prefix_is_hash() {
        let mut out = [0u8; 64];
        blake3_xof(b"data", &mut out);
        assert_eq!(&out[..32], &blake3_hash(b"data"));
    }

    #[test]
    fn test_derive_key() {
        let k1 = blake3_derive_key("quantum-rollup witness digest", b"seed");
        let k2 = blake3_derive_key("quantum-rollup witness digest", b"seed");
        let k3 = blake3_derive_key("quantum-rollup other", b"seed");
        assert_eq!(k1, k2);
        assert_ne!(k1, k3);
    }
}
