//! Cross-crate integration scenarios.

mod consensus_flow;
mod evm_flow;
mod proof_flow;
mod state_flow;
