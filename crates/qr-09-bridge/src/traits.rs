//! # Bridge Interface

use crate::errors::BridgeError;
use crate::events::{DepositEvent, StateCommitment, WithdrawalEvent};
use async_trait::async_trait;

/// Capability set for the L1 settlement contract.
#[async_trait]
pub trait L1Bridge: Send + Sync {
    /// Anchor a state commitment. The contract accepts it iff the
    /// aggregated proof's 32-byte prefix equals
    /// `BLAKE3(state_root || batch_hash)`.
    async fn submit_commitment(&self, commitment: StateCommitment) -> Result<(), BridgeError>;

    /// Drain deposits observed on L1 since the last call.
    async fn get_pending_deposits(&self) -> Result<Vec<DepositEvent>, BridgeError>;

    /// Pay out a withdrawal on L1.
    async fn process_withdrawal(&self, withdrawal: WithdrawalEvent) -> Result<(), BridgeError>;

    /// Escalate a fraud proof: the offending proof bytes plus the correct
    /// state snapshot bytes.
    async fn submit_fraud_proof(
        &self,
        invalid_proof: Vec<u8>,
        correct_state_snapshot: Vec<u8>,
    ) -> Result<(), BridgeError>;

    /// Halt the bridge; only exits remain possible afterwards.
    async fn trigger_emergency_shutdown(&self) -> Result<(), BridgeError>;

    /// True once the emergency brake has been pulled.
    async fn is_emergency_mode(&self) -> bool;
}
