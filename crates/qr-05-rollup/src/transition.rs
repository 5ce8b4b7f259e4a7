//! # State Transition Proofs
//!
//! A transition proof binds `(pre_state_root, post_state_root, batch)` with
//! a QZKP transcript over the batch's amplitude encoding and a node
//! signature over the root pair.

use crate::errors::RollupError;
use qr_01_quantum::{Complex, QState};
use qr_02_zkp::{ProofTranscript, QzkpProver, QzkpVerifier, VerificationResult};
use qr_03_state::StateStore;
use serde::{Deserialize, Serialize};
use shared_crypto::{blake3_hash_many, Keypair, SignatureScheme};
use shared_types::{Batch, Hash, Transaction};
use std::sync::Arc;

/// Bytes of each serialized transaction contributing to the encoding.
const TX_ENCODING_WIDTH: usize = 256;

/// Proof that applying a batch to `pre_state_root` yields
/// `post_state_root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransitionProof {
    /// Root before the batch.
    pub pre_state_root: Hash,
    /// Root after the batch.
    pub post_state_root: Hash,
    /// The batch hash (BLAKE3 over the ordered transactions).
    pub transactions_root: Hash,
    /// QZKP transcript over the batch's amplitude encoding.
    pub zk_proof: ProofTranscript,
    /// Node signature over `(pre || post || transactions_root)`.
    pub quantum_signature: Vec<u8>,
    /// Batch sequence number.
    pub batch_number: u64,
    /// Proof creation time (ms).
    pub timestamp: u64,
}

impl StateTransitionProof {
    /// Message bytes covered by `quantum_signature`.
    #[must_use]
    pub fn signing_message(&self) -> Hash {
        blake3_hash_many(&[
            &self.pre_state_root,
            &self.post_state_root,
            &self.transactions_root,
        ])
    }
}

/// Generator and verifier for transition proofs.
pub struct RollupStateTransition {
    prover: QzkpProver,
    verifier: QzkpVerifier,
    scheme: Arc<dyn SignatureScheme>,
    node_keys: Keypair,
}

impl RollupStateTransition {
    /// Create with a seeded prover and the node's signing identity.
    #[must_use]
    pub fn new(scheme: Arc<dyn SignatureScheme>, node_keys: Keypair, prover_seed: u64) -> Self {
        Self {
            prover: QzkpProver::with_seed(prover_seed),
            verifier: QzkpVerifier::new(),
            scheme,
            node_keys,
        }
    }

    /// Override the QZKP proving parameters and verification thresholds.
    pub fn configure_zkp(
        &mut self,
        phase_angles: Vec<f64>,
        measurement_qubits: usize,
        confidence_threshold: f64,
        measurement_tolerance: f64,
        fidelity_threshold: f64,
    ) {
        self.prover
            .update_optimal_parameters(phase_angles, measurement_qubits);
        self.verifier.set_confidence_threshold(confidence_threshold);
        self.verifier.set_measurement_tolerance(measurement_tolerance);
        self.verifier.set_fidelity_threshold(fidelity_threshold);
    }

    /// Generate a transition proof for a batch against the current state.
    ///
    /// The batch is applied to a clone; the live store is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Batch`] for structural violations and
    /// [`RollupError::InvalidTransaction`] when replay fails.
    pub fn generate_transition_proof(
        &mut self,
        batch: &Batch,
        state: &StateStore,
    ) -> Result<StateTransitionProof, RollupError> {
        batch.validate()?;

        let pre_state_root = state.get_state_root();

        let scratch = state.clone_store();
        scratch.apply_transactions(&batch.transactions)?;
        scratch.commit_state();
        let post_state_root = scratch.get_state_root();

        let batch_state = encode_batch(&batch.transactions)?;
        let zk_proof = self.prover.prove(&batch_state)?;

        let mut proof = StateTransitionProof {
            pre_state_root,
            post_state_root,
            transactions_root: batch.batch_hash,
            zk_proof,
            quantum_signature: Vec::new(),
            batch_number: batch.batch_number,
            timestamp: batch.timestamp,
        };
        proof.quantum_signature = self
            .scheme
            .sign(&self.node_keys.secret, &proof.signing_message())?;

        tracing::debug!(
            batch_number = batch.batch_number,
            transactions = batch.len(),
            "generated transition proof"
        );
        Ok(proof)
    }

    /// Verify a transition proof by replaying the batch on a clone of the
    /// pre-state and re-checking the QZKP transcript.
    ///
    /// # Errors
    ///
    /// Returns the specific failure; `Ok(())` means the transition holds.
    pub fn verify_transition(
        &self,
        proof: &StateTransitionProof,
        pre_state: &StateStore,
        transactions: &[Transaction],
    ) -> Result<(), RollupError> {
        if pre_state.get_state_root() != proof.pre_state_root {
            return Err(RollupError::RootMismatch);
        }

        let scratch = pre_state.clone_store();
        scratch.apply_transactions(transactions)?;
        scratch.commit_state();
        if scratch.get_state_root() != proof.post_state_root {
            return Err(RollupError::RootMismatch);
        }

        let batch_state = encode_batch(transactions)?;
        let report = self.verifier.verify(&proof.zk_proof, &batch_state);
        match report.result {
            VerificationResult::Valid => {}
            VerificationResult::Inconclusive => {
                return Err(RollupError::QzkpInconclusive(report.message))
            }
            VerificationResult::Invalid => {
                return Err(RollupError::QzkpMismatch(report.message))
            }
        }

        self.scheme.verify(
            &self.node_keys.public,
            &proof.signing_message(),
            &proof.quantum_signature,
        )?;
        Ok(())
    }

    /// Public key transition proofs are signed under.
    #[must_use]
    pub fn node_public_key(&self) -> &[u8] {
        &self.node_keys.public
    }
}

/// Encode a batch as an amplitude vector of dimension `n_tx * 256`: each
/// serialized transaction contributes one 256-byte lane (`amplitude =
/// byte / 255`), then the vector is normalized.
pub fn encode_batch(transactions: &[Transaction]) -> Result<QState, RollupError> {
    let mut amplitudes = vec![Complex::ZERO; transactions.len().max(1) * TX_ENCODING_WIDTH];
    for (lane, tx) in transactions.iter().enumerate() {
        let bytes = tx.canonical_bytes();
        for (offset, &byte) in bytes.iter().take(TX_ENCODING_WIDTH).enumerate() {
            amplitudes[lane * TX_ENCODING_WIDTH + offset] =
                Complex::real(f64::from(byte) / 255.0);
        }
    }
    let mut state = QState::from_amplitudes(amplitudes)?;
    state.normalize()?;
    Ok(state)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_crypto::Ed25519Scheme;
    use shared_types::{Account, Address};

    fn scheme() -> Arc<dyn SignatureScheme> {
        Arc::new(Ed25519Scheme::new())
    }

    struct Fixture {
        state: StateStore,
        rollup: RollupStateTransition,
        sender: Address,
        sender_keys: Keypair,
    }

    fn fixture() -> Fixture {
        let scheme = scheme();
        let sender_keys = scheme.keypair_from_seed([1u8; 32]);
        let sender = Address::from_public_key(&sender_keys.public);

        let state = StateStore::new(Arc::clone(&scheme));
        state.add_account(Account::new(sender, 10_000, sender_keys.public.clone()));
        state.commit_state();

        let node_keys = scheme.keypair_from_seed([2u8; 32]);
        let rollup = RollupStateTransition::new(Arc::clone(&scheme), node_keys, 42);
        Fixture {
            state,
            rollup,
            sender,
            sender_keys,
        }
    }

    fn signed_tx(fx: &Fixture, nonce: u64, amount: u64) -> Transaction {
        let mut tx = Transaction::new(
            fx.sender,
            Address::new([0xBB; 20]),
            amount,
            nonce,
            1,
            21_000,
            Vec::new(),
        );
        tx.signature = fx
            .state
            .scheme()
            .sign(&fx.sender_keys.secret, &tx.hash())
            .expect("signing");
        tx
    }

    fn batch_of(fx: &Fixture, txs: Vec<Transaction>) -> Batch {
        Batch::seal(1, txs, 1_700_000_000_000).expect("seal")
    }

    #[test]
    fn test_generate_and_verify_roundtrip() {
        let mut fx = fixture();
        let batch = batch_of(&fx, vec![signed_tx(&fx, 1, 100), signed_tx(&fx, 2, 50)]);

        let proof = fx
            .rollup
            .generate_transition_proof(&batch, &fx.state)
            .unwrap();

        assert_eq!(proof.pre_state_root, fx.state.get_state_root());
        assert_ne!(proof.post_state_root, proof.pre_state_root);
        assert_eq!(proof.transactions_root, batch.batch_hash);

        fx.rollup
            .verify_transition(&proof, &fx.state, &batch.transactions)
            .unwrap();
        // The live store was never mutated.
        assert_eq!(fx.state.get_account(&fx.sender).unwrap().nonce, 0);
    }

    #[test]
    fn test_invalid_transaction_rejected() {
        let mut fx = fixture();
        let mut bad = signed_tx(&fx, 1, 100);
        bad.signature = vec![0u8; 64];
        let batch = batch_of(&fx, vec![bad]);

        assert!(matches!(
            fx.rollup.generate_transition_proof(&batch, &fx.state),
            Err(RollupError::InvalidTransaction(_))
        ));
    }

    #[test]
    fn test_tampered_post_root_fails_verification() {
        let mut fx = fixture();
        let batch = batch_of(&fx, vec![signed_tx(&fx, 1, 100)]);
        let mut proof = fx
            .rollup
            .generate_transition_proof(&batch, &fx.state)
            .unwrap();
        proof.post_state_root[0] ^= 0xFF;

        assert!(matches!(
            fx.rollup
                .verify_transition(&proof, &fx.state, &batch.transactions),
            Err(RollupError::RootMismatch)
        ));
    }

    #[test]
    fn test_tampered_transactions_fail_verification() {
        let mut fx = fixture();
        let batch = batch_of(&fx, vec![signed_tx(&fx, 1, 100)]);
        let proof = fx
            .rollup
            .generate_transition_proof(&batch, &fx.state)
            .unwrap();

        // Different transaction set no longer replays to the post root.
        let other = vec![signed_tx(&fx, 1, 999)];
        assert!(fx
            .rollup
            .verify_transition(&proof, &fx.state, &other)
            .is_err());
    }

    #[test]
    fn test_misordered_batch_rejected() {
        let mut fx = fixture();
        let mut batch = batch_of(&fx, vec![signed_tx(&fx, 1, 10), signed_tx(&fx, 2, 10)]);
        batch.transactions.swap(0, 1);

        assert!(matches!(
            fx.rollup.generate_transition_proof(&batch, &fx.state),
            Err(RollupError::Batch(_))
        ));
    }

    #[test]
    fn test_encode_batch_dimension() {
        let fx = fixture();
        let txs = vec![signed_tx(&fx, 1, 10), signed_tx(&fx, 2, 10), signed_tx(&fx, 3, 10)];
        let state = encode_batch(&txs).unwrap();
        // 3 * 256 = 768, padded to the next power of two.
        assert_eq!(state.dimension(), 1024);
        assert!(state.is_valid());
    }
}
