//! # Shared Types
//!
//! Core domain entities shared by every rollup subsystem.
//!
//! ## Clusters
//!
//! - **Identity**: [`Address`], [`Hash`]
//! - **State**: [`Account`]
//! - **Chain**: [`Transaction`], [`Batch`]
//! - **Wire**: canonical little-endian encoding ([`wire`])

pub mod batch;
pub mod entities;
pub mod errors;
pub mod transaction;
pub mod wire;

pub use batch::{Batch, MAX_BATCH_TRANSACTIONS};
pub use entities::{Account, Address, Hash};
pub use errors::{BatchError, TransactionError, WireError};
pub use transaction::Transaction;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
