//! # QR-09-Bridge: L1 Anchoring
//!
//! The narrow interface to the settlement layer: submit state commitments,
//! observe deposits, process withdrawals, escalate fraud, and flip the
//! emergency brake. A real RPC client and the in-process mock contract
//! both live behind [`L1Bridge`].

pub mod errors;
pub mod events;
pub mod mock;
pub mod traits;

pub use errors::BridgeError;
pub use events::{DepositEvent, StateCommitment, WithdrawalEvent};
pub use mock::MockBridge;
pub use traits::L1Bridge;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
