//! # Consensus Metrics
//!
//! Rolling counters and exponential moving averages over batch production.

/// Smoothing factor for the moving averages.
const EMA_ALPHA: f64 = 0.1;

/// Rolling consensus metrics.
#[derive(Debug, Clone, Default)]
pub struct ConsensusMetrics {
    /// Batches processed since start.
    pub total_batches_processed: u64,
    /// Transactions processed since start.
    pub total_transactions_processed: u64,
    /// EMA of batch generation time in microseconds.
    pub avg_batch_time_us: f64,
    /// Signatures collected over witnesses selected, last batch.
    pub witness_participation_rate: f64,
    /// EMA of the quantum security score.
    pub quantum_security_score: f64,
    /// Times the error-correction recovery pass ran.
    pub error_corrections: u64,
}

impl ConsensusMetrics {
    /// Fold one batch observation into the metrics.
    pub fn record_batch(
        &mut self,
        transaction_count: usize,
        elapsed_us: f64,
        participation: f64,
        quantum_security: f64,
        corrected: bool,
    ) {
        self.total_batches_processed += 1;
        self.total_transactions_processed += transaction_count as u64;
        self.avg_batch_time_us = if self.total_batches_processed == 1 {
            elapsed_us
        } else {
            self.avg_batch_time_us * (1.0 - EMA_ALPHA) + elapsed_us * EMA_ALPHA
        };
        self.witness_participation_rate = participation;
        self.quantum_security_score = if self.total_batches_processed == 1 {
            quantum_security
        } else {
            self.quantum_security_score * (1.0 - EMA_ALPHA) + quantum_security * EMA_ALPHA
        };
        if corrected {
            self.error_corrections += 1;
        }
    }
}
