//! # Batch Processor
//!
//! Submission surface and scheduling. Single transactions flow through a
//! bounded queue into a worker pool; whole batches are partitioned into
//! conflict-free layers first. Contract calls serialize per target address
//! while at most `max_parallel_contracts` distinct contracts execute.

use crate::config::ProcessorConfig;
use crate::errors::ProcessorError;
use crate::partition::partition;
use crate::pool::ExecutorPool;
use primitive_types::U256;
use qr_03_state::StateStore;
use qr_04_evm::{execute_contract, ExecutionContext, ExecutionResult, Host, LogEntry};
use shared_types::{Address, Hash, Transaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// A contract execution request.
#[derive(Debug, Clone)]
pub struct ContractCall {
    /// Target contract.
    pub contract_address: Address,
    /// Calling account.
    pub caller: Address,
    /// Call data.
    pub input: Vec<u8>,
    /// Gas ceiling.
    pub gas_limit: u64,
}

/// Aggregate result of a batch submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Transactions applied successfully.
    pub applied: usize,
    /// Transactions rejected by the state store.
    pub failed: usize,
}

impl BatchOutcome {
    /// True when every transaction applied.
    #[must_use]
    pub fn all_applied(&self) -> bool {
        self.failed == 0
    }
}

/// The parallel batch processor.
pub struct BatchProcessor {
    config: ProcessorConfig,
    state: Arc<StateStore>,
    tx_sender: SyncSender<Transaction>,
    workers: Vec<JoinHandle<()>>,
    running: Arc<AtomicBool>,
    processed: Arc<AtomicU64>,
    failed: Arc<AtomicU64>,
    executor_pool: Arc<ExecutorPool>,
    contract_locks: Mutex<HashMap<Address, Arc<Mutex<()>>>>,
}

impl BatchProcessor {
    /// Start the processor and its worker pool.
    #[must_use]
    pub fn start(config: ProcessorConfig, state: Arc<StateStore>) -> Self {
        let (tx_sender, tx_receiver) = std::sync::mpsc::sync_channel(config.max_queue_size);
        let shared_receiver = Arc::new(Mutex::new(tx_receiver));
        let running = Arc::new(AtomicBool::new(true));
        let processed = Arc::new(AtomicU64::new(0));
        let failed = Arc::new(AtomicU64::new(0));

        let mut workers = Vec::with_capacity(config.num_worker_threads);
        for worker_id in 0..config.num_worker_threads.max(1) {
            let receiver = Arc::clone(&shared_receiver);
            let state = Arc::clone(&state);
            let running = Arc::clone(&running);
            let processed = Arc::clone(&processed);
            let failed = Arc::clone(&failed);
            let spawned = std::thread::Builder::new()
                .name(format!("batch-worker-{worker_id}"))
                .spawn(move || {
                    worker_loop(&receiver, &state, &running, &processed, &failed);
                });
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(error) => tracing::error!(%error, worker_id, "failed to spawn worker"),
            }
        }

        let executor_pool = ExecutorPool::new(if config.enable_contract_parallelization {
            config.max_parallel_contracts
        } else {
            1
        });

        Self {
            config,
            state,
            tx_sender,
            workers,
            running,
            processed,
            failed,
            executor_pool,
            contract_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Queue a single transaction for asynchronous application.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::BackpressureRejected`] when the queue is
    /// full and [`ProcessorError::Stopped`] after shutdown.
    pub fn submit_transaction(&self, tx: Transaction) -> Result<(), ProcessorError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(ProcessorError::Stopped);
        }
        match self.tx_sender.try_send(tx) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ProcessorError::BackpressureRejected),
            Err(TrySendError::Disconnected(_)) => Err(ProcessorError::Stopped),
        }
    }

    /// Partition a batch into conflict-free layers and apply them: layers
    /// serially, members of each layer in parallel. No two transactions
    /// sharing a sender or recipient ever apply concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::BatchTooLarge`] beyond the configured cap.
    pub fn submit_batch(&self, batch: &[Transaction]) -> Result<BatchOutcome, ProcessorError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(ProcessorError::Stopped);
        }
        if batch.len() > self.config.max_batch_size {
            return Err(ProcessorError::BatchTooLarge {
                len: batch.len(),
                max: self.config.max_batch_size,
            });
        }

        let mut applied = 0usize;
        let mut failed = 0usize;
        for layer in partition(batch) {
            let layer_applied = AtomicU64::new(0);
            std::thread::scope(|scope| {
                for tx in &layer {
                    let state = Arc::clone(&self.state);
                    let layer_applied = &layer_applied;
                    scope.spawn(move || {
                        if state.apply_transaction(tx).is_ok() {
                            layer_applied.fetch_add(1, Ordering::Relaxed);
                        }
                    });
                }
            });
            let ok = layer_applied.load(Ordering::Relaxed) as usize;
            applied += ok;
            failed += layer.len() - ok;
        }

        tracing::debug!(applied, failed, "batch submission complete");
        Ok(BatchOutcome { applied, failed })
    }

    /// Execute a contract call. Calls against the same contract serialize
    /// on a per-address lock; the executor pool bounds total concurrency.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessorError::NoContractCode`] for a codeless target.
    pub fn execute_contract(&self, call: &ContractCall) -> Result<ExecutionResult, ProcessorError> {
        if !self.running.load(Ordering::Relaxed) {
            return Err(ProcessorError::Stopped);
        }
        let code = self
            .state
            .get_code(&call.contract_address)
            .filter(|code| !code.is_empty())
            .ok_or(ProcessorError::NoContractCode)?;

        let address_lock = {
            let mut locks = self
                .contract_locks
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            Arc::clone(
                locks
                    .entry(call.contract_address)
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };

        let _serialized = address_lock.lock().unwrap_or_else(|e| e.into_inner());
        let _lease = self.executor_pool.checkout();

        let mut host = StateHost::new(Arc::clone(&self.state));
        let context = ExecutionContext::top_level(call.contract_address, call.caller);
        let result = execute_contract(&mut host, &context, &code, &call.input, call.gas_limit);
        host.flush();
        Ok(result)
    }

    /// Transactions applied by the worker pool so far.
    #[must_use]
    pub fn processed_count(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    /// Transactions rejected by the worker pool so far.
    #[must_use]
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Stop the workers and drain the queue.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl Drop for BatchProcessor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn worker_loop(
    receiver: &Arc<Mutex<Receiver<Transaction>>>,
    state: &Arc<StateStore>,
    running: &Arc<AtomicBool>,
    processed: &Arc<AtomicU64>,
    failed: &Arc<AtomicU64>,
) {
    loop {
        let next = {
            let guard = receiver.lock().unwrap_or_else(|e| e.into_inner());
            guard.recv_timeout(std::time::Duration::from_millis(50))
        };
        match next {
            Ok(tx) => match state.apply_transaction(&tx) {
                Ok(()) => {
                    processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(error) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(%error, "transaction rejected");
                }
            },
            Err(_) => {
                if !running.load(Ordering::Relaxed) {
                    break;
                }
            }
        }
    }
}

/// Host adapter bridging the interpreter to the state store. Storage
/// writes buffer locally and flush after the call so a reverted execution
/// leaves the store untouched.
struct StateHost {
    state: Arc<StateStore>,
    pending_storage: Vec<(Address, Hash, Hash)>,
    pending_logs: Vec<LogEntry>,
}

impl StateHost {
    fn new(state: Arc<StateStore>) -> Self {
        Self {
            state,
            pending_storage: Vec::new(),
            pending_logs: Vec::new(),
        }
    }

    fn flush(&mut self) {
        for (address, key, value) in self.pending_storage.drain(..) {
            if self
                .state
                .set_storage(&address, key.to_vec(), value.to_vec())
                .is_err()
            {
                tracing::warn!(%address, "dropping storage write to missing account");
            }
        }
        for log in self.pending_logs.drain(..) {
            tracing::debug!(address = %log.address, topics = log.topics.len(), "contract log");
        }
    }
}

impl Host for StateHost {
    fn balance(&self, address: &Address) -> U256 {
        self.state
            .get_account(address)
            .map_or_else(U256::zero, |account| U256::from(account.balance))
    }

    fn sload(&self, address: &Address, key: &Hash) -> Hash {
        // Pending writes shadow the committed value.
        for (pending_address, pending_key, value) in self.pending_storage.iter().rev() {
            if pending_address == address && pending_key == key {
                return *value;
            }
        }
        self.state
            .get_storage(address, key)
            .and_then(|bytes| bytes.try_into().ok())
            .unwrap_or([0u8; 32])
    }

    fn sstore(&mut self, address: &Address, key: Hash, value: Hash) {
        self.pending_storage.push((*address, key, value));
    }

    fn code(&self, address: &Address) -> Vec<u8> {
        self.state.get_code(address).unwrap_or_default()
    }

    fn set_code(&mut self, address: &Address, code: Vec<u8>) {
        if self.state.set_code(address, code).is_err() {
            tracing::warn!(%address, "code deployment rejected");
        }
    }

    fn transfer(&mut self, from: &Address, to: &Address, value: U256) -> bool {
        if value.is_zero() {
            return true;
        }
        if value > U256::from(u64::MAX) {
            return false;
        }
        let amount = value.as_u64();
        let Some(from_account) = self.state.get_account(from) else {
            return false;
        };
        if from_account.balance < amount {
            return false;
        }
        let to_balance = self
            .state
            .get_account(to)
            .map_or(0, |account| account.balance);
        self.state
            .set_balance(from, from_account.balance - amount)
            .is_ok()
            && self.state.set_balance(to, to_balance + amount).is_ok()
    }

    fn log(&mut self, entry: LogEntry) {
        self.pending_logs.push(entry);
    }

    fn nonce(&self, address: &Address) -> u64 {
        self.state
            .get_account(address)
            .map_or(0, |account| account.nonce)
    }

    fn increment_nonce(&mut self, address: &Address) {
        if let Some(account) = self.state.get_account(address) {
            let _ = self.state.set_nonce(address, account.nonce + 1);
        }
    }

    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address) {
        let balance = self
            .state
            .get_account(address)
            .map_or(0, |account| account.balance);
        let heir_balance = self
            .state
            .get_account(beneficiary)
            .map_or(0, |account| account.balance);
        let _ = self.state.set_balance(address, 0);
        let _ = self
            .state
            .set_balance(beneficiary, heir_balance + balance);
    }
}

// =============================================================================
// TESTS
// =============================================================================
