//! # Fraud Proofs
//!
//! A fraud proof accuses a committed transition of being wrong. The
//! accuser ships the pre/post account snapshots and the batch; verifiers
//! replay the batch deterministically and compare the replayed state with
//! the claimed post-state. The per-address differences, encoded as an
//! amplitude vector, carry a QZKP transcript binding the accusation.

use crate::errors::RollupError;
use qr_01_quantum::{Complex, QState};
use qr_02_zkp::{ProofTranscript, QzkpProver, QzkpVerifier, VerificationResult};
use qr_03_state::{compute_state_root, StateStore};
use serde::{Deserialize, Serialize};
use shared_crypto::SignatureScheme;
use shared_types::{Account, Address, Hash, Transaction};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Difference-state norm above which a transition counts as fraudulent.
pub const FRAUD_NORM_THRESHOLD: f64 = 1e-9;

/// Evidence that a claimed state transition disagrees with replay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudProof {
    /// Root of the agreed pre-state.
    pub pre_state_root: Hash,
    /// Root the accused transition claims.
    pub post_state_root: Hash,
    /// The batch the accused transition covers.
    pub transactions: Vec<Transaction>,
    /// Account snapshot backing `pre_state_root`.
    pub pre_accounts: BTreeMap<Address, Account>,
    /// Account snapshot backing `post_state_root`.
    pub post_accounts: BTreeMap<Address, Account>,
    /// QZKP transcript over the pre/post difference state.
    pub validity_proof: ProofTranscript,
}

/// Result of fraud-proof verification.
#[derive(Debug, Clone)]
pub struct FraudVerdict {
    /// True when replay contradicts the claimed post-state.
    pub fraud_detected: bool,
    /// Norm of the replayed-vs-claimed difference state.
    pub difference_norm: f64,
    /// Explanation for operators.
    pub message: String,
}

/// Generates and verifies fraud proofs.
pub struct FraudVerifier {
    prover: QzkpProver,
    verifier: QzkpVerifier,
    scheme: Arc<dyn SignatureScheme>,
}

impl FraudVerifier {
    /// Create with a seeded transcript prover.
    #[must_use]
    pub fn new(scheme: Arc<dyn SignatureScheme>, prover_seed: u64) -> Self {
        Self {
            prover: QzkpProver::with_seed(prover_seed),
            verifier: QzkpVerifier::new(),
            scheme,
        }
    }

    /// Build a fraud proof from the pre-state, the claimed post-state and
    /// the batch that allegedly connects them.
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::Zkp`] if transcript generation fails.
    pub fn generate_fraud_proof(
        &mut self,
        pre_state: &StateStore,
        claimed_post: &StateStore,
        transactions: Vec<Transaction>,
    ) -> Result<FraudProof, RollupError> {
        let pre_accounts = pre_state.accounts_snapshot();
        let post_accounts = claimed_post.accounts_snapshot();

        let difference = encode_state_diff(&pre_accounts, &post_accounts)?;
        let validity_proof = self.prover.prove(&proof_state_for_diff(&difference)?)?;

        Ok(FraudProof {
            pre_state_root: compute_state_root(&pre_accounts),
            post_state_root: compute_state_root(&post_accounts),
            transactions,
            pre_accounts,
            post_accounts,
            validity_proof,
        })
    }

    /// Verify a fraud proof.
    ///
    /// Checks, in order: snapshot roots match the claimed roots; the QZKP
    /// transcript verifies over the embedded difference state; the batch
    /// replays on the pre-state. Fraud is detected iff the replayed state
    /// differs from the claimed post-state by more than
    /// [`FRAUD_NORM_THRESHOLD`].
    ///
    /// # Errors
    ///
    /// Returns [`RollupError::RootMismatch`], [`RollupError::QzkpMismatch`]
    /// or [`RollupError::ReplayFailed`] when the proof itself is defective.
    pub fn verify_fraud_proof(&self, proof: &FraudProof) -> Result<FraudVerdict, RollupError> {
        if compute_state_root(&proof.pre_accounts) != proof.pre_state_root
            || compute_state_root(&proof.post_accounts) != proof.post_state_root
        {
            return Err(RollupError::RootMismatch);
        }

        let embedded_diff = encode_state_diff(&proof.pre_accounts, &proof.post_accounts)?;
        let report = self
            .verifier
            .verify(&proof.validity_proof, &proof_state_for_diff(&embedded_diff)?);
        if report.result != VerificationResult::Valid {
            return Err(RollupError::QzkpMismatch(report.message));
        }

        let replay = StateStore::from_accounts(
            Arc::clone(&self.scheme),
            proof.pre_accounts.clone(),
        );
        replay
            .apply_transactions(&proof.transactions)
            .map_err(|e| RollupError::ReplayFailed(e.to_string()))?;

        let replayed_accounts = replay.accounts_snapshot();
        let difference = encode_state_diff(&replayed_accounts, &proof.post_accounts)?;
        let difference_norm = difference.norm();
        let fraud_detected = difference_norm > FRAUD_NORM_THRESHOLD;

        Ok(FraudVerdict {
            fraud_detected,
            difference_norm,
            message: if fraud_detected {
                "claimed post-state diverges from deterministic replay".into()
            } else {
                "claimed post-state matches replay".into()
            },
        })
    }
}

/// The state the transcript ranges over: the unit-normalized difference,
/// or the canonical basis state when the difference is (near) zero. Both
/// sides derive this identically, so transcripts stay comparable while the
/// raw norm keeps carrying the fraud signal.
fn proof_state_for_diff(difference: &QState) -> Result<QState, RollupError> {
    let mut state = difference.clone();
    if state.norm() > FRAUD_NORM_THRESHOLD {
        state.normalize()?;
        // Quantized commitments cover magnitudes in [0, 1]; rescaling never
        // exceeds that after normalization.
        Ok(state)
    } else {
        // At least one qubit so the transcript has something to measure.
        let dimension = state.dimension().max(2);
        let mut basis = QState::from_amplitudes(vec![Complex::ZERO; dimension])?;
        basis.set_amplitude(0, Complex::ONE)?;
        Ok(basis)
    }
}

/// Encode per-address `(balance, nonce)` differences between two account
/// snapshots as an unnormalized amplitude vector. Addresses present on
/// either side contribute two interleaved lanes; equal states encode to
/// the zero vector.
pub fn encode_state_diff(
    pre: &BTreeMap<Address, Account>,
    post: &BTreeMap<Address, Account>,
) -> Result<QState, RollupError> {
    let mut amplitudes = Vec::with_capacity(2 * pre.len().max(post.len()).max(1));

    let addresses: std::collections::BTreeSet<&Address> =
        pre.keys().chain(post.keys()).collect();
    for address in addresses {
        let (pre_balance, pre_nonce) = pre
            .get(address)
            .map_or((0.0, 0.0), |a| (a.balance as f64, a.nonce as f64));
        let (post_balance, post_nonce) = post
            .get(address)
            .map_or((0.0, 0.0), |a| (a.balance as f64, a.nonce as f64));
        amplitudes.push(Complex::real(post_balance - pre_balance));
        amplitudes.push(Complex::real(post_nonce - pre_nonce));
    }
    if amplitudes.is_empty() {
        amplitudes.push(Complex::ZERO);
    }

    Ok(QState::from_amplitudes(amplitudes)?)
}

// =============================================================================
// TESTS
// =============================================================================
