//! # Node Configuration
//!
//! Unified configuration for all subsystems with sane defaults. Every
//! field is overridable; `from_env` reads the common knobs from the
//! process environment.

use qr_06_consensus::BatchConfig;
use qr_07_batch::ProcessorConfig;
use qr_10_p2p::P2pConfig;
use std::path::PathBuf;

/// Rollup-level parameters.
#[derive(Debug, Clone)]
pub struct RollupConfig {
    /// Chain id exposed to contract execution.
    pub chain_id: u64,
    /// Target interval between produced batches, in milliseconds.
    pub batch_interval_ms: u64,
    /// Upper bound on transactions per produced batch.
    pub batch_size: usize,
    /// Seed for the transition-proof prover RNG.
    pub prover_seed: u64,
    /// Local witnesses spawned at startup (testing and single-node runs).
    pub local_witnesses: usize,
}

impl Default for RollupConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            batch_interval_ms: 2000,
            batch_size: 100,
            prover_seed: 42,
            local_witnesses: 7,
        }
    }
}

/// QZKP proving and verification parameters.
#[derive(Debug, Clone)]
pub struct ZkpConfig {
    /// Phase-angle schedule length; fresh angles are drawn per proof.
    pub optimal_phase_angles: Vec<f64>,
    /// Measurements per transcript.
    pub optimal_measurement_qubits: usize,
    /// Verifier acceptance threshold.
    pub confidence_threshold: f64,
    /// Measurement agreement tolerance.
    pub measurement_tolerance: f64,
    /// Minimum commitment fidelity.
    pub fidelity_threshold: f64,
}

impl Default for ZkpConfig {
    fn default() -> Self {
        Self {
            optimal_phase_angles: vec![
                0.0,
                std::f64::consts::FRAC_PI_4,
                std::f64::consts::FRAC_PI_2,
                3.0 * std::f64::consts::FRAC_PI_4,
            ],
            optimal_measurement_qubits: 8,
            confidence_threshold: 0.95,
            measurement_tolerance: 0.10,
            fidelity_threshold: 0.90,
        }
    }
}

/// Complete node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Rollup parameters.
    pub rollup: RollupConfig,
    /// QZKP parameters.
    pub zkp: ZkpConfig,
    /// POBPC parameters.
    pub consensus: BatchConfig,
    /// Parallel processor parameters.
    pub processor: ProcessorConfig,
    /// P2P transport parameters.
    pub network: P2pConfig,
    /// Persistent storage root; in-memory storage when unset.
    pub data_dir: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rollup: RollupConfig::default(),
            zkp: ZkpConfig::default(),
            consensus: BatchConfig::default(),
            processor: ProcessorConfig::default(),
            network: P2pConfig::default(),
            data_dir: None,
        }
    }
}

impl NodeConfig {
    /// Build a configuration from the environment, falling back to the
    /// defaults for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var("QR_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(value) = env_parse("QR_BATCH_SIZE") {
            config.rollup.batch_size = value;
            config.consensus.batch_size = value;
        }
        if let Some(value) = env_parse("QR_BATCH_INTERVAL_MS") {
            config.rollup.batch_interval_ms = value;
        }
        if let Some(value) = env_parse("QR_WORKER_THREADS") {
            config.processor.num_worker_threads = value;
        }
        if let Some(value) = env_parse("QR_WITNESS_COUNT") {
            config.consensus.witness_count = value;
            config.rollup.local_witnesses = value;
        }
        if let Some(value) = env_parse("QR_CONSENSUS_THRESHOLD") {
            config.consensus.consensus_threshold = value;
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|raw| raw.parse().ok())
}
