//! # QR-02-ZKP: Quantum Zero-Knowledge Proofs
//!
//! Commitment-and-measurement proofs over amplitude vectors: the prover
//! applies random phase rotations, measures a random qubit subset, and emits
//! a transcript the verifier replays against the claimed state.
//!
//! ## Components
//!
//! - `transcript` - Proof transcripts and their structural invariants
//! - `prover` - Transcript generation (serial and segmented-parallel)
//! - `verifier` - Replay verification and confidence scoring

#![warn(missing_docs)]

pub mod errors;
pub mod prover;
pub mod transcript;
pub mod verifier;

pub use errors::ZkpError;
pub use prover::QzkpProver;
pub use transcript::{ProofTranscript, SegmentedProof};
pub use verifier::{QzkpVerifier, VerificationReport, VerificationResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
