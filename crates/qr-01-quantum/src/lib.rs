//! # QR-01-Quantum: Amplitude Vectors
//!
//! Finite-dimensional complex state vectors with gate application and
//! measurement. This is linear algebra with sampling; no physical quantum
//! hardware is implied anywhere in the node.
//!
//! ## Components
//!
//! - `complex` - Complex number value type
//! - `state` - [`QState`]: the amplitude vector and its operations

#![warn(missing_docs)]

pub mod complex;
pub mod errors;
pub mod state;

pub use complex::Complex;
pub use errors::QuantumError;
pub use state::{QState, NORM_TOLERANCE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
