//! # Mock Bridge
//!
//! An in-process stand-in for the settlement contract, faithful to its
//! acceptance rule. Tests seed deposits and observe accepted commitments
//! directly.

use crate::errors::BridgeError;
use crate::events::{DepositEvent, StateCommitment, WithdrawalEvent};
use crate::traits::L1Bridge;
use async_trait::async_trait;
use shared_crypto::blake3_hash_many;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct MockInner {
    commitments: Vec<StateCommitment>,
    pending_deposits: VecDeque<DepositEvent>,
    processed_withdrawals: Vec<WithdrawalEvent>,
    fraud_reports: Vec<(Vec<u8>, Vec<u8>)>,
}

/// In-process mock of the L1 rollup contract.
#[derive(Default)]
pub struct MockBridge {
    inner: Mutex<MockInner>,
    emergency: AtomicBool,
}

impl MockBridge {
    /// Fresh mock contract.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a deposit for the node to pick up.
    pub fn push_deposit(&self, deposit: DepositEvent) {
        self.lock().pending_deposits.push_back(deposit);
    }

    /// Commitments the contract accepted, in order.
    #[must_use]
    pub fn accepted_commitments(&self) -> Vec<StateCommitment> {
        self.lock().commitments.clone()
    }

    /// Withdrawals paid out so far.
    #[must_use]
    pub fn processed_withdrawals(&self) -> Vec<WithdrawalEvent> {
        self.lock().processed_withdrawals.clone()
    }

    /// Fraud reports escalated so far.
    #[must_use]
    pub fn fraud_report_count(&self) -> usize {
        self.lock().fraud_reports.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// The contract-side acceptance rule for commitments.
#[must_use]
pub fn commitment_accepted(commitment: &StateCommitment) -> bool {
    let expected = blake3_hash_many(&[&commitment.state_root, &commitment.batch_hash]);
    commitment.aggregated_proof.len() >= 32 && commitment.aggregated_proof[..32] == expected
}

#[async_trait]
impl L1Bridge for MockBridge {
    async fn submit_commitment(&self, commitment: StateCommitment) -> Result<(), BridgeError> {
        if self.emergency.load(Ordering::Relaxed) {
            return Err(BridgeError::EmergencyMode);
        }
        if !commitment_accepted(&commitment) {
            return Err(BridgeError::CommitmentRejected(
                "aggregated proof prefix does not bind the roots".into(),
            ));
        }
        tracing::info!(batch_size = commitment.batch_size, "commitment anchored");
        self.lock().commitments.push(commitment);
        Ok(())
    }

    async fn get_pending_deposits(&self) -> Result<Vec<DepositEvent>, BridgeError> {
        Ok(self.lock().pending_deposits.drain(..).collect())
    }

    async fn process_withdrawal(&self, withdrawal: WithdrawalEvent) -> Result<(), BridgeError> {
        let mut inner = self.lock();
        let known_root = inner
            .commitments
            .iter()
            .any(|commitment| commitment.state_root == withdrawal.state_root);
        if !known_root {
            return Err(BridgeError::UnknownWithdrawal);
        }
        inner.processed_withdrawals.push(withdrawal);
        Ok(())
    }

    async fn submit_fraud_proof(
        &self,
        invalid_proof: Vec<u8>,
        correct_state_snapshot: Vec<u8>,
    ) -> Result<(), BridgeError> {
        self.lock()
            .fraud_reports
            .push((invalid_proof, correct_state_snapshot));
        // A substantiated fraud report halts the contract.
        self.emergency.store(true, Ordering::Relaxed);
        tracing::warn!("fraud proof escalated; bridge halted");
        Ok(())
    }

    async fn trigger_emergency_shutdown(&self) -> Result<(), BridgeError> {
        self.emergency.store(true, Ordering::Relaxed);
        Ok(())
    }

    async fn is_emergency_mode(&self) -> bool {
        self.emergency.load(Ordering::Relaxed)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::Address;

    fn valid_commitment() -> StateCommitment {
        let state_root = [1u8; 32];
        let batch_hash = [2u8; 32];
        StateCommitment {
            state_root,
            batch_hash,
            batch_size: 3,
            aggregated_proof: blake3_hash_many(&[&state_root, &batch_hash]).to_vec(),
        }
    }

    #[tokio::test]
    async fn test_valid_commitment_accepted() {
        let bridge = MockBridge::new();
        bridge.submit_commitment(valid_commitment()).await.unwrap();
        assert_eq!(bridge.accepted_commitments().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_proof_prefix_rejected() {
        let bridge = MockBridge::new();
        let mut commitment = valid_commitment();
        commitment.aggregated_proof[0] ^= 0xFF;

        assert!(matches!(
            bridge.submit_commitment(commitment).await,
            Err(BridgeError::CommitmentRejected(_))
        ));
    }

    #[tokio::test]
    async fn test_deposits_drain_once() {
        let bridge = MockBridge::new();
        bridge.push_deposit(DepositEvent {
            l1_address: vec![1, 2, 3],
            l2_address: Address::new([4u8; 20]),
            amount: 500,
            timestamp: 1,
        });

        assert_eq!(bridge.get_pending_deposits().await.unwrap().len(), 1);
        assert!(bridge.get_pending_deposits().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_withdrawal_requires_committed_root() {
        let bridge = MockBridge::new();
        let commitment = valid_commitment();
        let withdrawal = WithdrawalEvent {
            l2_address: Address::new([9u8; 20]),
            l1_address: vec![1],
            amount: 10,
            state_root: commitment.state_root,
        };

        assert_eq!(
            bridge.process_withdrawal(withdrawal.clone()).await,
            Err(BridgeError::UnknownWithdrawal)
        );

        bridge.submit_commitment(commitment).await.unwrap();
        bridge.process_withdrawal(withdrawal).await.unwrap();
        assert_eq!(bridge.processed_withdrawals().len(), 1);
    }

    #[tokio::test]
    async fn test_emergency_mode_blocks_commitments() {
        let bridge = MockBridge::new();
        bridge.trigger_emergency_shutdown().await.unwrap();
        assert!(bridge.is_emergency_mode().await);

        assert_eq!(
            bridge.submit_commitment(valid_commitment()).await,
            Err(BridgeError::EmergencyMode)
        );
    }

    #[tokio::test]
    async fn test_fraud_proof_halts_bridge() {
        let bridge = MockBridge::new();
        bridge
            .submit_fraud_proof(vec![1, 2], vec![3, 4])
            .await
            .unwrap();
        assert_eq!(bridge.fraud_report_count(), 1);
        assert!(bridge.is_emergency_mode().await);
    }
}
