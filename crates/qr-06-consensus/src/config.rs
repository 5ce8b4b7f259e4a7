//! # Consensus Configuration

/// Voting and proving parameters for the POBPC engine.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum transactions drained into one batch proof.
    pub batch_size: usize,
    /// Number of witnesses selected per batch (`W`).
    pub witness_count: usize,
    /// Fraction of `W` whose signatures must verify (`τ`, in `(0, 1]`).
    pub consensus_threshold: f64,
    /// Gate operations applied when building the quantum proof.
    pub quantum_circuit_depth: usize,
    /// Attach quantum proofs to batches.
    pub use_quantum_proofs: bool,
    /// Run the syndrome check and recovery pass after circuit application.
    pub enable_error_correction: bool,
    /// Bounded transaction queue capacity.
    pub max_queue_size: usize,
    /// Wall-clock budget for witness votes on a batch, in milliseconds.
    pub vote_deadline_ms: u64,
}

impl BatchConfig {
    /// Minimum valid signatures required for consensus: `⌈W · τ⌉`.
    #[must_use]
    pub fn required_signatures(&self) -> usize {
        (self.witness_count as f64 * self.consensus_threshold).ceil() as usize
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            witness_count: 7,
            consensus_threshold: 0.67,
            quantum_circuit_depth: 8,
            use_quantum_proofs: true,
            enable_error_correction: true,
            max_queue_size: 10_000,
            vote_deadline_ms: 5_000,
        }
    }
}
