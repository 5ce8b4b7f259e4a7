//! # QR-04-EVM: Deterministic Executor
//!
//! A stack machine over 256-bit words with a fixed-cost opcode subset and
//! gas-metered memory. Execution is fully deterministic: every environment
//! value enters through [`ExecutionContext`], and all state access goes
//! through the [`Host`] capability trait.
//!
//! ## Components
//!
//! - `stack` - LIFO of U256, max depth 1024
//! - `memory` - byte-addressed, auto-expanding, quadratic expansion gas
//! - `opcodes` / `gas` - the opcode subset and its cost table
//! - `interpreter` - the execution loop
//! - `host` - state access trait plus an in-memory host for tests

pub mod context;
pub mod errors;
pub mod gas;
pub mod host;
pub mod interpreter;
pub mod memory;
pub mod opcodes;
pub mod stack;

pub use context::ExecutionContext;
pub use errors::VmError;
pub use host::{Host, InMemoryHost, LogEntry};
pub use interpreter::{execute_contract, ExecutionResult};
pub use memory::Memory;
pub use stack::Stack;

// Re-export U256 so downstream crates share the arithmetic type.
pub use primitive_types::U256;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
