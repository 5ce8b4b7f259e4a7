//! # Bridge Data Types

use serde::{Deserialize, Serialize};
use shared_types::{Address, Hash};

/// A state commitment anchored on L1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateCommitment {
    /// Committed L2 state root.
    pub state_root: Hash,
    /// Hash of the batch that produced the root.
    pub batch_hash: Hash,
    /// Transactions in the batch.
    pub batch_size: usize,
    /// Aggregated proof blob; the contract checks its 32-byte prefix
    /// against `BLAKE3(state_root || batch_hash)`.
    pub aggregated_proof: Vec<u8>,
}

/// A deposit observed on L1, to be credited on L2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    /// Depositing L1 account.
    pub l1_address: Vec<u8>,
    /// Receiving L2 account.
    pub l2_address: Address,
    /// Amount in base units.
    pub amount: u64,
    /// L1 observation time (ms).
    pub timestamp: u64,
}

/// A withdrawal initiated on L2, to be paid out on L1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalEvent {
    /// Withdrawing L2 account.
    pub l2_address: Address,
    /// Receiving L1 account.
    pub l1_address: Vec<u8>,
    /// Amount in base units.
    pub amount: u64,
    /// State root the withdrawal exits against.
    pub state_root: Hash,
}
