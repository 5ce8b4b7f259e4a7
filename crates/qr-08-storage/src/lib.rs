//! # QR-08-Storage: Persistent Store
//!
//! Append/lookup for transactions (by hash), blocks and proofs (by
//! number) behind the [`RollupStore`] trait. Two adapters ship: an
//! in-memory store for tests and a file-backed store with atomic writes
//! and an exclusive directory lock.

pub mod errors;
pub mod file;
pub mod memory;
pub mod traits;

pub use errors::StorageError;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use traits::RollupStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
