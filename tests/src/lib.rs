//! # Quantum-Rollup Test Suite
//!
//! Cross-crate integration scenarios. Each subsystem keeps its own unit
//! tests; this crate exercises the flows that cut across them.

pub mod support;

#[cfg(test)]
mod integration;
