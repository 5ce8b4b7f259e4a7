//! # QR-05-Rollup: State Transition Proofs
//!
//! Binds batches to state-root transitions with QZKP transcripts, detects
//! invalid transitions by deterministic replay, and produces account-scoped
//! emergency exits against committed roots.
//!
//! ## Components
//!
//! - `transition` - batch application and [`StateTransitionProof`]
//! - `fraud` - replay-based fraud proofs over difference states
//! - `exit` - per-account emergency exits

pub mod errors;
pub mod exit;
pub mod fraud;
pub mod transition;

pub use errors::RollupError;
pub use exit::{EmergencyExit, ExitProof};
pub use fraud::{FraudProof, FraudVerdict, FraudVerifier, FRAUD_NORM_THRESHOLD};
pub use transition::{RollupStateTransition, StateTransitionProof};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
