//! # QR-03-State: Account State Store
//!
//! The single owner of rollup accounts. A reader-writer lock guards the
//! account map; batch application is all-or-nothing through a scratch
//! snapshot, and state roots are BLAKE3 digests over the address-sorted
//! canonical account serializations.

#![warn(missing_docs)]

pub mod errors;
pub mod store;

pub use errors::StateError;
pub use store::{compute_state_root, StateStore, MAX_HISTORY_PER_ACCOUNT};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
