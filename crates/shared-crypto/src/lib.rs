//! # Shared Crypto
//!
//! Cryptographic primitives shared across the rollup node.
//!
//! ## Components
//!
//! - `hashing` - BLAKE3 digests (one-shot, keyed, key derivation)
//! - `scheme` - The pluggable [`SignatureScheme`] capability interface
//! - `ed25519` - Default signature scheme (Ed25519)
//! - `ladder` - Hash-ladder one-time scheme with Falcon-size parameter sets

pub mod ed25519;
pub mod errors;
pub mod hashing;
pub mod ladder;
pub mod scheme;

pub use ed25519::Ed25519Scheme;
pub use errors::CryptoError;
pub use hashing::{blake3_hash, blake3_hash_many, blake3_keyed_hash, Blake3Hasher, Hash};
pub use ladder::{HashLadderScheme, LadderParam};
pub use scheme::{Keypair, SignatureScheme};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
