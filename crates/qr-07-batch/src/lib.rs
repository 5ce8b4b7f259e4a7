//! # QR-07-Batch: Parallel Batch Processor
//!
//! Dependency-aware transaction scheduling: conflicting transactions are
//! layered into serially-applied sub-batches, non-conflicting ones run in
//! parallel across a worker pool, and contract calls serialize per target
//! address.
//!
//! ## Components
//!
//! - `partition` - sender/recipient conflict layering
//! - `pool` - bounded executor pool with checkout/return
//! - `processor` - submission queues, workers and contract dispatch

pub mod config;
pub mod errors;
pub mod partition;
pub mod pool;
pub mod processor;

pub use config::ProcessorConfig;
pub use errors::ProcessorError;
pub use partition::{conflicts, partition};
pub use pool::ExecutorPool;
pub use processor::{BatchOutcome, BatchProcessor, ContractCall};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
