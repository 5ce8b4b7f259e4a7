//! # POBPC Engine
//!
//! Batch proof generation and verification. The keyed digest state is
//! derived once from configuration at construction and never mutates
//! across batches, so provers and verifiers built from the same
//! configuration fold identical per-transaction digests.

use crate::config::BatchConfig;
use crate::errors::ConsensusError;
use crate::metrics::ConsensusMetrics;
use crate::proof::{BatchProof, CircuitOp, QuantumProof};
use crate::witness::{WitnessInfo, WitnessRegistry};
use qr_01_quantum::QState;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use shared_crypto::{blake3_hash, blake3_keyed_hash, SignatureScheme};
use shared_types::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Measurements recorded per quantum proof.
const PROOF_MEASUREMENTS: usize = 10;

/// Minimum fidelity between the recorded initial state and the state
/// re-derived from the batch hash.
const INITIAL_STATE_FIDELITY: f64 = 0.99;

/// Amplitude magnitude above which the syndrome check fires.
const SYNDROME_LIMIT: f64 = 1.0 + 1e-6;

/// The POBPC consensus engine.
pub struct PobpcEngine {
    config: BatchConfig,
    scheme: Arc<dyn SignatureScheme>,
    witnesses: WitnessRegistry,
    tx_sender: SyncSender<Vec<u8>>,
    tx_receiver: Mutex<Receiver<Vec<u8>>>,
    digest_key: [u8; 32],
    rng: Mutex<StdRng>,
    degraded: AtomicBool,
    metrics: Mutex<ConsensusMetrics>,
}

impl PobpcEngine {
    /// Create an engine seeded from system entropy.
    #[must_use]
    pub fn new(config: BatchConfig, scheme: Arc<dyn SignatureScheme>) -> Self {
        Self::with_seed(config, scheme, rand::thread_rng().next_u64())
    }

    /// Create an engine with a fixed RNG seed (reproducible proofs).
    #[must_use]
    pub fn with_seed(config: BatchConfig, scheme: Arc<dyn SignatureScheme>, seed: u64) -> Self {
        let (tx_sender, tx_receiver) = std::sync::mpsc::sync_channel(config.max_queue_size);
        let digest_key = derive_digest_key(&config);
        Self {
            config,
            scheme,
            witnesses: WitnessRegistry::new(),
            tx_sender,
            tx_receiver: Mutex::new(tx_receiver),
            digest_key,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            degraded: AtomicBool::new(false),
            metrics: Mutex::new(ConsensusMetrics::default()),
        }
    }

    /// Engine configuration.
    #[must_use]
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// True once a failed recovery put the engine into degraded mode.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Register a remote witness.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InvalidRegistration`] for empty inputs.
    pub fn register_witness(&self, id: &str, public_key: Vec<u8>) -> Result<(), ConsensusError> {
        self.witnesses.register(id, public_key)
    }

    /// Register a witness hosted in this process (signs during batch
    /// generation).
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InvalidRegistration`] for empty inputs.
    pub fn register_local_witness(
        &self,
        id: &str,
        public_key: Vec<u8>,
        secret_key: Vec<u8>,
    ) -> Result<(), ConsensusError> {
        self.witnesses.register_local(id, public_key, secret_key)
    }

    /// Top-`W` witnesses by reliability, ties broken by id.
    #[must_use]
    pub fn select_witnesses(&self) -> Vec<WitnessInfo> {
        self.witnesses
            .select_top(self.config.witness_count)
            .iter()
            .map(|entry| WitnessInfo {
                id: entry.id.clone(),
                public_key: entry.public_key.clone(),
                reliability: entry.reliability(),
                successes: 0,
                total: 0,
            })
            .collect()
    }

    /// Queue a serialized transaction for the next batch.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::QueueFull`] when the bounded queue is at
    /// capacity.
    pub fn submit_transaction(&self, transaction: Vec<u8>) -> Result<(), ConsensusError> {
        match self.tx_sender.try_send(transaction) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Err(ConsensusError::QueueFull)
            }
        }
    }

    /// Drain queued transactions into a witness-signed batch proof.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::EmptyBatch`] with nothing queued,
    /// [`ConsensusError::Degraded`] in degraded mode, or
    /// [`ConsensusError::RecoveryFailed`] from the error-correction path.
    pub fn generate_batch_proof(&self) -> Result<BatchProof, ConsensusError> {
        if self.is_degraded() {
            return Err(ConsensusError::Degraded(
                "refusing to produce batches until restart".into(),
            ));
        }
        let started = Instant::now();

        let transactions = self.drain_batch();
        if transactions.is_empty() {
            return Err(ConsensusError::EmptyBatch);
        }

        let batch_hash = self.derive_batch_hash(&transactions);
        let quantum_proof = self.build_quantum_proof(batch_hash)?;

        // Every selected in-process witness signs the batch hash; remote
        // witnesses vote later through `submit_witness_vote`.
        let selected = self.witnesses.select_top(self.config.witness_count);
        let mut witness_signatures = Vec::with_capacity(selected.len());
        for entry in &selected {
            if let Some(secret) = &entry.secret_key {
                if let Ok(signature) = self.scheme.sign(secret, &batch_hash) {
                    witness_signatures.push((entry.id.clone(), signature));
                }
            }
        }

        let proof = BatchProof {
            timestamp: now_ms(),
            transaction_count: transactions.len(),
            batch_hash,
            transactions,
            witness_signatures,
            quantum_proof,
        };

        let participation = if selected.is_empty() {
            0.0
        } else {
            proof.witness_signatures.len() as f64 / self.config.witness_count as f64
        };
        let quantum_security = self.quantum_security_score(&proof);
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .record_batch(
                proof.transaction_count,
                started.elapsed().as_micros() as f64,
                participation,
                quantum_security,
                proof.quantum_proof.error_corrected,
            );

        tracing::debug!(
            transactions = proof.transaction_count,
            signatures = proof.witness_signatures.len(),
            "generated batch proof"
        );
        Ok(proof)
    }

    /// Verify a batch proof end to end.
    ///
    /// # Errors
    ///
    /// Returns the first failed check; `Ok(())` means consensus holds.
    pub fn verify_batch_proof(&self, proof: &BatchProof) -> Result<(), ConsensusError> {
        if !proof.is_well_formed(self.config.batch_size) {
            return Err(ConsensusError::StructureInvalid(
                "missing hash, transactions or measurements".into(),
            ));
        }
        if proof.witness_signatures.len() > self.config.witness_count {
            return Err(ConsensusError::StructureInvalid(
                "more signatures than selected witnesses".into(),
            ));
        }

        // Re-derive the batch hash, re-running the content-mixing pass.
        if self.derive_batch_hash(&proof.transactions) != proof.batch_hash {
            return Err(ConsensusError::HashMismatch);
        }

        if self.config.use_quantum_proofs {
            self.verify_quantum_proof(&proof.quantum_proof, proof.batch_hash)?;
        }

        let valid = self.count_valid_signatures(proof);
        let required = self.config.required_signatures();
        if valid < required {
            return Err(ConsensusError::ConsensusNotReached { valid, required });
        }
        Ok(())
    }

    /// Consensus predicate: the proof verifies in full.
    #[must_use]
    pub fn has_reached_consensus(&self, proof: &BatchProof) -> bool {
        self.verify_batch_proof(proof).is_ok()
    }

    /// Submit one witness vote for a batch proof. The witness reliability
    /// counters move on every verification; votes past the deadline are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::UnknownWitness`] or
    /// [`ConsensusError::VoteDeadlineExpired`].
    pub fn submit_witness_vote(
        &self,
        witness_id: &str,
        signature: &[u8],
        proof: &BatchProof,
    ) -> Result<bool, ConsensusError> {
        let entry = self
            .witnesses
            .get(witness_id)
            .ok_or_else(|| ConsensusError::UnknownWitness(witness_id.to_string()))?;

        if now_ms().saturating_sub(proof.timestamp) > self.config.vote_deadline_ms {
            return Err(ConsensusError::VoteDeadlineExpired);
        }

        let verified = self
            .scheme
            .verify(&entry.public_key, &proof.batch_hash, signature)
            .is_ok();
        entry.record_vote(verified);
        Ok(verified)
    }

    /// Consensus confidence:
    /// `0.6 · quantum_security + 0.4 · mean(reliability of signers)`.
    #[must_use]
    pub fn calculate_confidence(&self, proof: &BatchProof) -> f64 {
        if proof.witness_signatures.is_empty() {
            return 0.0;
        }

        let quantum_security = self.quantum_security_score(proof);

        let mut reliability_sum = 0.0;
        let mut signers = 0usize;
        for (id, signature) in &proof.witness_signatures {
            if let Some(entry) = self.witnesses.get(id) {
                if self
                    .scheme
                    .verify(&entry.public_key, &proof.batch_hash, signature)
                    .is_ok()
                {
                    reliability_sum += entry.reliability();
                    signers += 1;
                }
            }
        }
        let witness_confidence = if signers == 0 {
            0.0
        } else {
            reliability_sum / signers as f64
        };

        0.6 * quantum_security + 0.4 * witness_confidence
    }

    /// Current metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> ConsensusMetrics {
        self.metrics
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn drain_batch(&self) -> Vec<Vec<u8>> {
        let receiver = self.tx_receiver.lock().unwrap_or_else(|e| e.into_inner());
        let mut batch = Vec::with_capacity(self.config.batch_size);
        while batch.len() < self.config.batch_size {
            match receiver.try_recv() {
                Ok(tx) => batch.push(tx),
                Err(_) => break,
            }
        }
        batch
    }

    /// Batch hash: content-mix a copy of the batch, then XOR-fold the
    /// keyed digest of every mixed transaction.
    fn derive_batch_hash(&self, transactions: &[Vec<u8>]) -> Hash {
        let mixed = content_mix(transactions);
        let mut folded = [0u8; 32];
        for tx in &mixed {
            let digest = blake3_keyed_hash(&self.digest_key, tx);
            for (byte, digest_byte) in folded.iter_mut().zip(digest.iter()) {
                *byte ^= digest_byte;
            }
        }
        folded
    }

    fn build_quantum_proof(&self, batch_hash: Hash) -> Result<QuantumProof, ConsensusError> {
        let initial_state = QState::from_bytes(&batch_hash)
            .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;

        let num_qubits = initial_state.num_qubits().max(1);
        let mut operations = Vec::with_capacity(self.config.quantum_circuit_depth * 2);
        for i in 0..self.config.quantum_circuit_depth {
            operations.push(CircuitOp::Hadamard(i % num_qubits));
            if num_qubits > 1 {
                operations.push(CircuitOp::Cnot(i % num_qubits, (i + 1) % num_qubits));
            }
        }

        let mut working = initial_state.clone();
        apply_circuit(&mut working, &operations)
            .map_err(|e| ConsensusError::QuantumProofInvalid(e))?;

        let error_corrected = if self.config.enable_error_correction {
            self.run_error_correction(&mut working)?
        } else {
            false
        };

        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let mut measurements = Vec::with_capacity(PROOF_MEASUREMENTS);
        for i in 0..PROOF_MEASUREMENTS {
            let outcome = working
                .measure(i % num_qubits, &mut *rng)
                .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;
            measurements.push(outcome);
        }

        Ok(QuantumProof {
            initial_state,
            circuit_operations: operations,
            measurements,
            error_corrected,
        })
    }

    /// Syndrome check and recovery: an amplitude magnitude above 1 flags
    /// an error; recovery renormalizes and re-verifies. A failed recovery
    /// degrades the engine.
    fn run_error_correction(&self, state: &mut QState) -> Result<bool, ConsensusError> {
        let flagged = state
            .amplitudes()
            .iter()
            .any(|amplitude| amplitude.abs() > SYNDROME_LIMIT);
        if !flagged {
            return Ok(false);
        }

        if state.normalize().is_err() || !state.is_valid() {
            self.degraded.store(true, Ordering::Relaxed);
            tracing::error!("quantum state recovery failed; entering degraded mode");
            return Err(ConsensusError::RecoveryFailed);
        }
        Ok(true)
    }

    fn verify_quantum_proof(
        &self,
        proof: &QuantumProof,
        batch_hash: Hash,
    ) -> Result<(), ConsensusError> {
        let expected = QState::from_bytes(&batch_hash)
            .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;
        let fidelity = proof
            .initial_state
            .fidelity(&expected)
            .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;
        if fidelity < INITIAL_STATE_FIDELITY {
            return Err(ConsensusError::QuantumProofInvalid(format!(
                "initial state fidelity {fidelity:.4} below {INITIAL_STATE_FIDELITY}"
            )));
        }

        // Replay the circuit and condition on the recorded outcomes; an
        // outcome with (near) zero probability is unreplayable.
        let mut working = proof.initial_state.clone();
        apply_circuit(&mut working, &proof.circuit_operations)
            .map_err(ConsensusError::QuantumProofInvalid)?;

        let num_qubits = working.num_qubits().max(1);
        for (i, &outcome) in proof.measurements.iter().enumerate() {
            let qubit = i % num_qubits;
            let prob_one = working
                .probability_one(qubit)
                .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;
            let prob_recorded = if outcome { prob_one } else { 1.0 - prob_one };
            if prob_recorded < 1e-9 {
                return Err(ConsensusError::QuantumProofInvalid(format!(
                    "measurement {i} outcome has zero probability"
                )));
            }
            working
                .collapse(qubit, outcome, prob_one)
                .map_err(|e| ConsensusError::QuantumProofInvalid(e.to_string()))?;
        }
        Ok(())
    }

    fn count_valid_signatures(&self, proof: &BatchProof) -> usize {
        proof
            .witness_signatures
            .iter()
            .filter(|(id, signature)| {
                self.witnesses.get(id).is_some_and(|entry| {
                    self.scheme
                        .verify(&entry.public_key, &proof.batch_hash, signature)
                        .is_ok()
                })
            })
            .count()
    }

    /// `0.3 · entanglement + 0.3 · coherence + 0.4 · fidelity`, each term
    /// normalized into `[0, 1]`.
    fn quantum_security_score(&self, proof: &BatchProof) -> f64 {
        let state = &proof.quantum_proof.initial_state;
        let dimension = state.dimension() as f64;

        let entanglement = if dimension > 1.0 {
            (state.entropy() / dimension.log2()).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let coherence = if dimension > 1.0 {
            (state.coherence() / (dimension - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let fidelity = QState::from_bytes(&proof.batch_hash)
            .ok()
            .and_then(|expected| state.fidelity(&expected).ok())
            .unwrap_or(0.0);

        0.3 * entanglement + 0.3 * coherence + 0.4 * fidelity
    }
}

/// Deterministic content-mixing pass over a copy of the batch: the first
/// 32-byte block of transaction `i > 0` is XORed with the already-mixed
/// block of transaction `i - 1`. Transactions shorter than one block pass
/// through untouched. Binding only; not a security primitive.
#[must_use]
pub fn content_mix(transactions: &[Vec<u8>]) -> Vec<Vec<u8>> {
    let mut mixed: Vec<Vec<u8>> = transactions.to_vec();
    for i in 1..mixed.len() {
        if mixed[i].len() < 32 || mixed[i - 1].len() < 32 {
            continue;
        }
        let (previous, current) = mixed.split_at_mut(i);
        let prev_block: [u8; 32] = previous[i - 1][..32]
            .try_into()
            .unwrap_or([0u8; 32]);
        for (byte, prev_byte) in current[0][..32].iter_mut().zip(prev_block.iter()) {
            *byte ^= prev_byte;
        }
    }
    mixed
}

fn derive_digest_key(config: &BatchConfig) -> [u8; 32] {
    // The consensus state is fixed from configuration and never mutated
    // across batches; its amplitude dump keys every per-transaction digest.
    let mut material = Vec::with_capacity(64);
    material.extend_from_slice(&(config.batch_size as u64).to_le_bytes());
    material.extend_from_slice(&(config.witness_count as u64).to_le_bytes());
    material.extend_from_slice(&config.consensus_threshold.to_le_bytes());
    material.extend_from_slice(&(config.quantum_circuit_depth as u64).to_le_bytes());
    let seed_hash = blake3_hash(&material);

    match QState::from_bytes(&seed_hash) {
        Ok(consensus_state) => blake3_hash(&consensus_state.to_amplitude_bytes()),
        Err(_) => seed_hash,
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn apply_circuit(state: &mut QState, operations: &[CircuitOp]) -> Result<(), String> {
    for operation in operations {
        match *operation {
            CircuitOp::Hadamard(qubit) => state
                .apply_hadamard(qubit)
                .map_err(|e| e.to_string())?,
            CircuitOp::Cnot(control, target) => state
                .apply_cnot(control, target)
                .map_err(|e| e.to_string())?,
        }
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
