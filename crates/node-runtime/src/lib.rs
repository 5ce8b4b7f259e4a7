//! # Node Runtime
//!
//! Wires the subsystems into a running rollup node: state store, parallel
//! processor, consensus engine, proof generation, persistence, the L1
//! bridge and the P2P transport.

pub mod config;
pub mod node;

pub use config::{NodeConfig, RollupConfig, ZkpConfig};
pub use node::{NodeError, RollupNode};
