//! # Rollup Node
//!
//! The assembled node. Transactions enter through `submit_transaction`;
//! `produce_batch` drives the full pipeline: seal, prove the transition,
//! reach witness consensus, persist, anchor on L1 and broadcast.

use crate::config::NodeConfig;
use qr_03_state::StateStore;
use qr_05_rollup::{EmergencyExit, FraudVerifier, RollupError, RollupStateTransition, StateTransitionProof};
use qr_06_consensus::{BatchProof, ConsensusError, PobpcEngine};
use qr_07_batch::{BatchProcessor, ProcessorError};
use qr_08_storage::{FileStore, MemoryStore, RollupStore, StorageError};
use qr_09_bridge::{BridgeError, L1Bridge, MockBridge, StateCommitment};
use qr_10_p2p::{NetMessage, P2pTransport};
use shared_bus::{EventBus, RollupEvent};
use shared_crypto::{blake3_hash_many, Ed25519Scheme, SignatureScheme};
use shared_types::{Batch, BatchError, Transaction};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors from node-level operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Batch assembly failed.
    #[error(transparent)]
    Batch(#[from] BatchError),

    /// Proof generation or verification failed.
    #[error(transparent)]
    Rollup(#[from] RollupError),

    /// Direct state mutation failed.
    #[error(transparent)]
    State(#[from] qr_03_state::StateError),

    /// Consensus failed or is degraded.
    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    /// Submission was rejected by the processor.
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// Persistence failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// L1 anchoring failed.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Proof serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No transactions are pending.
    #[error("nothing to batch")]
    NothingToBatch,
}

/// Result of one produced batch.
#[derive(Debug)]
pub struct ProducedBatch {
    /// The sealed batch.
    pub batch: Batch,
    /// Transition proof binding pre and post roots.
    pub transition: StateTransitionProof,
    /// Witness-signed consensus proof.
    pub consensus: BatchProof,
    /// Combined consensus confidence.
    pub confidence: f64,
}

/// The assembled rollup node.
pub struct RollupNode {
    config: NodeConfig,
    state: Arc<StateStore>,
    processor: BatchProcessor,
    consensus: Arc<PobpcEngine>,
    transition: Mutex<RollupStateTransition>,
    fraud: Mutex<FraudVerifier>,
    exit: EmergencyExit,
    storage: Arc<dyn RollupStore>,
    bridge: Arc<dyn L1Bridge>,
    bus: EventBus,
    transport: Option<P2pTransport>,
    pending: Mutex<Vec<Transaction>>,
    next_batch_number: AtomicU64,
}

impl RollupNode {
    /// Assemble a node from configuration with the default collaborators
    /// (Ed25519 scheme, mock bridge, file or memory storage).
    ///
    /// # Errors
    ///
    /// Returns a [`NodeError`] when storage cannot be opened.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        let scheme: Arc<dyn SignatureScheme> = Arc::new(Ed25519Scheme::new());
        let storage: Arc<dyn RollupStore> = match &config.data_dir {
            Some(dir) => Arc::new(FileStore::open(dir.clone())?),
            None => Arc::new(MemoryStore::new()),
        };
        Self::assemble(config, scheme, storage, Arc::new(MockBridge::new()), None)
    }

    /// Assemble a node with explicit collaborators.
    ///
    /// # Errors
    ///
    /// Currently infallible; kept fallible for storage-backed callers.
    pub fn assemble(
        config: NodeConfig,
        scheme: Arc<dyn SignatureScheme>,
        storage: Arc<dyn RollupStore>,
        bridge: Arc<dyn L1Bridge>,
        transport: Option<P2pTransport>,
    ) -> Result<Self, NodeError> {
        let state = Arc::new(StateStore::new(Arc::clone(&scheme)));
        let processor = BatchProcessor::start(config.processor.clone(), Arc::clone(&state));
        let consensus = Arc::new(PobpcEngine::with_seed(
            config.consensus.clone(),
            Arc::clone(&scheme),
            config.rollup.prover_seed,
        ));

        // Single-node runs host their own witnesses; a cluster registers
        // remote witness keys instead.
        for index in 0..config.rollup.local_witnesses {
            let mut seed = [0u8; 32];
            seed[..8].copy_from_slice(&(index as u64 + 1).to_le_bytes());
            seed[8] = 0xA7;
            let keys = scheme.keypair_from_seed(seed);
            let _ = consensus.register_local_witness(
                &format!("local-witness-{index:02}"),
                keys.public.clone(),
                keys.secret.to_vec(),
            );
        }

        let node_keys = scheme.generate_keypair();
        let mut transition_inner = RollupStateTransition::new(
            Arc::clone(&scheme),
            node_keys,
            config.rollup.prover_seed,
        );
        transition_inner.configure_zkp(
            config.zkp.optimal_phase_angles.clone(),
            config.zkp.optimal_measurement_qubits,
            config.zkp.confidence_threshold,
            config.zkp.measurement_tolerance,
            config.zkp.fidelity_threshold,
        );
        let transition = Mutex::new(transition_inner);
        let fraud = Mutex::new(FraudVerifier::new(
            Arc::clone(&scheme),
            config.rollup.prover_seed,
        ));
        let exit = EmergencyExit::new(Arc::clone(&scheme));

        Ok(Self {
            config,
            state,
            processor,
            consensus,
            transition,
            fraud,
            exit,
            storage,
            bridge,
            bus: EventBus::new(),
            transport,
            pending: Mutex::new(Vec::new()),
            next_batch_number: AtomicU64::new(1),
        })
    }

    /// Shared account state.
    #[must_use]
    pub fn state(&self) -> Arc<StateStore> {
        Arc::clone(&self.state)
    }

    /// The event bus for observers.
    #[must_use]
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    /// The consensus engine.
    #[must_use]
    pub fn consensus(&self) -> Arc<PobpcEngine> {
        Arc::clone(&self.consensus)
    }

    /// The emergency-exit facility.
    #[must_use]
    pub fn exit_facility(&self) -> &EmergencyExit {
        &self.exit
    }

    /// The fraud-proof facility.
    #[must_use]
    pub fn fraud_facility(&self) -> &Mutex<FraudVerifier> {
        &self.fraud
    }

    /// The parallel batch processor.
    #[must_use]
    pub fn processor(&self) -> &BatchProcessor {
        &self.processor
    }

    /// Accept a transaction into the pending set for the next batch.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Consensus`] when the consensus queue applies
    /// backpressure.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), NodeError> {
        self.consensus.submit_transaction(tx.canonical_bytes())?;
        self.bus
            .publish(RollupEvent::TransactionSubmitted { tx_hash: tx.hash() });
        self.pending
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tx);
        Ok(())
    }

    /// Transactions waiting for the next batch.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Produce one batch: seal the pending set, prove the transition,
    /// reach consensus, persist, anchor and broadcast.
    ///
    /// # Errors
    ///
    /// Returns the first pipeline failure; the live state is only
    /// committed after the whole pipeline succeeds.
    pub async fn produce_batch(&self) -> Result<ProducedBatch, NodeError> {
        let drained: Vec<Transaction> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            let take = pending.len().min(self.config.rollup.batch_size);
            pending.drain(..take).collect()
        };
        if drained.is_empty() {
            return Err(NodeError::NothingToBatch);
        }

        let batch_number = self.next_batch_number.fetch_add(1, Ordering::SeqCst);
        let batch = Batch::seal(batch_number, drained, now_ms())?;
        self.bus.publish(RollupEvent::BatchSealed {
            batch_number,
            batch_hash: batch.batch_hash,
            transaction_count: batch.len(),
        });

        // Transition proof over a clone; the live store moves afterwards.
        let transition = self
            .transition
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .generate_transition_proof(&batch, &self.state)?;
        self.bus.publish(RollupEvent::TransitionProven {
            batch_number,
            pre_state_root: transition.pre_state_root,
            post_state_root: transition.post_state_root,
        });

        // Witness consensus over the same transactions.
        let consensus_proof = self.consensus.generate_batch_proof()?;
        self.consensus.verify_batch_proof(&consensus_proof)?;
        let confidence = self.consensus.calculate_confidence(&consensus_proof);
        self.bus.publish(RollupEvent::ConsensusReached {
            batch_hash: consensus_proof.batch_hash,
            confidence,
        });

        // Apply for real and commit the new root.
        self.state.apply_transactions(&batch.transactions)?;
        self.state.commit_state();

        self.persist(&batch, &transition, &consensus_proof)?;
        self.anchor(&batch, &transition).await?;

        if let Some(transport) = &self.transport {
            let bytes = bincode::serialize(&transition)
                .map_err(|e| NodeError::Serialization(e.to_string()))?;
            transport.broadcast(&NetMessage::TransitionProof(bytes));
        }

        tracing::info!(
            batch_number,
            transactions = batch.len(),
            confidence,
            "produced batch"
        );
        Ok(ProducedBatch {
            batch,
            transition,
            consensus: consensus_proof,
            confidence,
        })
    }

    /// Credit deposits observed on the bridge.
    ///
    /// # Errors
    ///
    /// Returns [`NodeError::Bridge`] when the bridge is unreachable.
    pub async fn process_deposits(&self) -> Result<usize, NodeError> {
        let deposits = self.bridge.get_pending_deposits().await?;
        let count = deposits.len();
        for deposit in deposits {
            let mut account = self
                .state
                .get_account(&deposit.l2_address)
                .unwrap_or_else(|| {
                    shared_types::Account::new(deposit.l2_address, 0, Vec::new())
                });
            account.balance += deposit.amount;
            self.state.add_account(account);
        }
        if count > 0 {
            self.state.commit_state();
        }
        Ok(count)
    }

    fn persist(
        &self,
        batch: &Batch,
        transition: &StateTransitionProof,
        consensus: &BatchProof,
    ) -> Result<(), NodeError> {
        for tx in &batch.transactions {
            self.storage.put_tx(&tx.hash(), &tx.canonical_bytes())?;
        }
        let block_bytes =
            bincode::serialize(batch).map_err(|e| NodeError::Serialization(e.to_string()))?;
        self.storage.put_block(batch.batch_number, &block_bytes)?;

        let proof_bytes = bincode::serialize(&(transition, consensus))
            .map_err(|e| NodeError::Serialization(e.to_string()))?;
        self.storage.put_proof(batch.batch_number, &proof_bytes)?;
        self.storage.sync()?;
        Ok(())
    }

    async fn anchor(
        &self,
        batch: &Batch,
        transition: &StateTransitionProof,
    ) -> Result<(), NodeError> {
        let mut aggregated_proof =
            blake3_hash_many(&[&transition.post_state_root, &batch.batch_hash]).to_vec();
        aggregated_proof.extend_from_slice(&transition.zk_proof.magnitude_commitment);

        self.bridge
            .submit_commitment(StateCommitment {
                state_root: transition.post_state_root,
                batch_hash: batch.batch_hash,
                batch_size: batch.len(),
                aggregated_proof,
            })
            .await?;
        self.bus.publish(RollupEvent::CommitmentAnchored {
            batch_number: batch.batch_number,
            state_root: transition.post_state_root,
        });
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Account, Address};

    fn test_node() -> (RollupNode, Vec<(Address, shared_crypto::Keypair)>) {
        let config = NodeConfig::default();
        let node = RollupNode::new(config).unwrap();

        let scheme = node.state().scheme();
        let mut keys = Vec::new();
        for i in 0..3u8 {
            let keypair = scheme.keypair_from_seed([i + 10; 32]);
            let address = Address::from_public_key(&keypair.public);
            node.state()
                .add_account(Account::new(address, 50_000, keypair.public.clone()));
            keys.push((address, keypair));
        }
        node.state().commit_state();
        (node, keys)
    }

    fn signed(
        node: &RollupNode,
        keys: &[(Address, shared_crypto::Keypair)],
        from: usize,
        to: usize,
        nonce: u64,
    ) -> Transaction {
        let (sender, keypair) = &keys[from];
        let mut tx = Transaction::new(
            *sender,
            keys[to].0,
            100,
            nonce,
            1,
            21_000,
            Vec::new(),
        );
        tx.signature = node
            .state()
            .scheme()
            .sign(&keypair.secret, &tx.hash())
            .expect("sign");
        tx
    }

    #[tokio::test]
    async fn test_end_to_end_batch_production() {
        let (node, keys) = test_node();

        node.submit_transaction(signed(&node, &keys, 0, 1, 1)).unwrap();
        node.submit_transaction(signed(&node, &keys, 1, 2, 1)).unwrap();

        let root_before = node.state().get_state_root();
        let produced = node.produce_batch().await.unwrap();

        assert_eq!(produced.batch.batch_number, 1);
        assert_eq!(produced.batch.len(), 2);
        assert_eq!(produced.transition.pre_state_root, root_before);
        assert_eq!(node.state().get_state_root(), produced.transition.post_state_root);
        assert!(produced.confidence > 0.0);
        assert_eq!(node.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_production_rejected() {
        let (node, _keys) = test_node();
        assert!(matches!(
            node.produce_batch().await,
            Err(NodeError::NothingToBatch)
        ));
    }

    #[tokio::test]
    async fn test_batch_numbers_increase() {
        let (node, keys) = test_node();

        node.submit_transaction(signed(&node, &keys, 0, 1, 1)).unwrap();
        let first = node.produce_batch().await.unwrap();

        node.submit_transaction(signed(&node, &keys, 0, 1, 2)).unwrap();
        let second = node.produce_batch().await.unwrap();

        assert_eq!(first.batch.batch_number + 1, second.batch.batch_number);
    }

    #[tokio::test]
    async fn test_deposits_credit_accounts() {
        let (node, _keys) = test_node();
        let bridge = Arc::new(MockBridge::new());
        let target = Address::new([0xDD; 20]);
        bridge.push_deposit(qr_09_bridge::DepositEvent {
            l1_address: vec![1],
            l2_address: target,
            amount: 777,
            timestamp: 1,
        });

        let node = RollupNode::assemble(
            NodeConfig::default(),
            node.state().scheme(),
            Arc::new(MemoryStore::new()),
            bridge,
            None,
        )
        .unwrap();

        assert_eq!(node.process_deposits().await.unwrap(), 1);
        assert_eq!(node.state().get_account(&target).unwrap().balance, 777);
    }
}
