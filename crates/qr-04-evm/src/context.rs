//! # Execution Context
//!
//! Every environmental value the interpreter can observe. Nothing inside
//! `execute_contract` reads a clock or RNG; determinism property 9 holds by
//! construction.

use primitive_types::U256;
use shared_types::Address;

/// Environment for a single execution frame.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Account whose code is executing.
    pub address: Address,
    /// Immediate caller of this frame.
    pub caller: Address,
    /// Value transferred into this frame.
    pub call_value: U256,
    /// Block timestamp exposed to TIMESTAMP.
    pub timestamp: u64,
    /// Block number exposed to NUMBER.
    pub block_number: u64,
    /// Chain id exposed to CHAINID.
    pub chain_id: u64,
    /// True inside a STATICCALL frame; writes are rejected.
    pub is_static: bool,
    /// Current call depth.
    pub depth: u16,
}

impl ExecutionContext {
    /// Context for a top-level call.
    #[must_use]
    pub fn top_level(address: Address, caller: Address) -> Self {
        Self {
            address,
            caller,
            call_value: U256::zero(),
            timestamp: 0,
            block_number: 0,
            chain_id: 1,
            is_static: false,
            depth: 0,
        }
    }

    /// Derive the context for a nested frame.
    #[must_use]
    pub fn child(&self, address: Address, caller: Address, value: U256, is_static: bool) -> Self {
        Self {
            address,
            caller,
            call_value: value,
            timestamp: self.timestamp,
            block_number: self.block_number,
            chain_id: self.chain_id,
            is_static: self.is_static || is_static,
            depth: self.depth + 1,
        }
    }
}

/// Maximum nested call depth.
pub const MAX_CALL_DEPTH: u16 = 1024;
