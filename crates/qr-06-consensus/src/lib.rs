//! # QR-06-Consensus: Proof-of-Batch-Probabilistic-Consensus
//!
//! Witness-sampled batch consensus: transactions drain from a bounded
//! queue into deterministic batch proofs, reliability-ranked witnesses
//! sign the batch hash, and a proof reaches consensus once the valid
//! signature count clears the configured threshold.
//!
//! ## Components
//!
//! - `config` - [`BatchConfig`] voting and proving parameters
//! - `witness` - registry with atomic reliability counters
//! - `proof` - [`BatchProof`] / [`QuantumProof`] artifacts
//! - `engine` - the [`PobpcEngine`] generate/verify/vote surface
//! - `metrics` - rolling consensus metrics

pub mod config;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod proof;
pub mod witness;

pub use config::BatchConfig;
pub use engine::PobpcEngine;
pub use errors::ConsensusError;
pub use metrics::ConsensusMetrics;
pub use proof::{BatchProof, CircuitOp, QuantumProof};
pub use witness::{WitnessInfo, WitnessRegistry};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
