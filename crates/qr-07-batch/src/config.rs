//! # Processor Configuration

/// Tuning for the parallel batch processor.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Worker threads applying queued transactions.
    pub num_worker_threads: usize,
    /// Bounded submission queue capacity.
    pub max_queue_size: usize,
    /// Execute contract calls for distinct addresses concurrently.
    pub enable_contract_parallelization: bool,
    /// Maximum distinct contracts executing at once.
    pub max_parallel_contracts: usize,
    /// Maximum transactions accepted per submitted batch.
    pub max_batch_size: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            num_worker_threads: 4,
            max_queue_size: 1000,
            enable_contract_parallelization: true,
            max_parallel_contracts: 4,
            max_batch_size: 100,
        }
    }
}
