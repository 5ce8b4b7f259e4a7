//! # Batch Proof Artifacts
//!
//! The batch proof carries everything a verifier needs to re-derive the
//! batch hash: the raw transactions (mixing is re-run on a copy), the
//! quantum proof, and the collected witness signatures.

use qr_01_quantum::QState;
use serde::{Deserialize, Serialize};
use shared_types::Hash;

/// One gate application in the consensus circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitOp {
    /// Hadamard on a qubit.
    Hadamard(usize),
    /// Controlled-NOT between two qubits.
    Cnot(usize, usize),
}

/// Quantum proof over a batch commitment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantumProof {
    /// State derived from the batch hash before circuit application.
    pub initial_state: QState,
    /// Circuit operations applied, in order.
    pub circuit_operations: Vec<CircuitOp>,
    /// Recorded measurement outcomes after the circuit.
    pub measurements: Vec<bool>,
    /// True when the syndrome check fired and recovery ran.
    pub error_corrected: bool,
}

/// A witness-signed batch proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchProof {
    /// Proof creation time (ms).
    pub timestamp: u64,
    /// Number of transactions in the batch.
    pub transaction_count: usize,
    /// XOR-fold of keyed per-transaction digests over the mixed batch.
    pub batch_hash: Hash,
    /// The drained transactions, unmixed.
    pub transactions: Vec<Vec<u8>>,
    /// `(witness_id, signature)` pairs over `batch_hash`.
    pub witness_signatures: Vec<(String, Vec<u8>)>,
    /// Quantum proof over the batch commitment.
    pub quantum_proof: QuantumProof,
}

impl BatchProof {
    /// Structural validity: hash set, transaction count consistent and at
    /// least one measurement recorded.
    #[must_use]
    pub fn is_well_formed(&self, max_batch_size: usize) -> bool {
        self.batch_hash != [0u8; 32]
            && self.transaction_count > 0
            && self.transaction_count == self.transactions.len()
            && self.transaction_count <= max_batch_size
            && !self.quantum_proof.measurements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qr_01_quantum::QState;

    fn sample_proof() -> BatchProof {
        BatchProof {
            timestamp: 1,
            transaction_count: 1,
            batch_hash: [1u8; 32],
            transactions: vec![vec![0xAA]],
            witness_signatures: Vec::new(),
            quantum_proof: QuantumProof {
                initial_state: QState::from_bytes(&[1, 2, 3]).unwrap(),
                circuit_operations: vec![CircuitOp::Hadamard(0)],
                measurements: vec![true],
                error_corrected: false,
            },
        }
    }

    #[test]
    fn test_well_formed() {
        assert!(sample_proof().is_well_formed(100));
    }

    #[test]
    fn test_rejects_inconsistent_count() {
        let mut proof = sample_proof();
        proof.transaction_count = 2;
        assert!(!proof.is_well_formed(100));
    }

    #[test]
    fn test_rejects_zero_hash_and_oversize() {
        let mut proof = sample_proof();
        proof.batch_hash = [0u8; 32];
        assert!(!proof.is_well_formed(100));

        let proof = sample_proof();
        assert!(!proof.is_well_formed(0));
    }
}
