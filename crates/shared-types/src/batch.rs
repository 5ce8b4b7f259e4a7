//! # Batches
//!
//! Ordered transaction sequences committed as a unit. The canonical order is
//! nonce-ascending with ties broken by transaction hash, and the batch hash
//! is BLAKE3 over the transactions concatenated in that order.

use crate::entities::Hash;
use crate::errors::BatchError;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use shared_crypto::Blake3Hasher;
use std::cmp::Ordering;

/// Hard upper bound on transactions per batch.
pub const MAX_BATCH_TRANSACTIONS: usize = 1000;

/// An ordered sequence of transactions processed atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    /// Strictly increasing batch sequence number.
    pub batch_number: u64,
    /// Transactions in canonical order.
    pub transactions: Vec<Transaction>,
    /// BLAKE3 over the ordered transaction serializations.
    pub batch_hash: Hash,
    /// Unix timestamp at sealing.
    pub timestamp: u64,
}

/// Canonical comparison: nonce ascending, ties broken by transaction hash.
fn canonical_cmp(a: &Transaction, b: &Transaction) -> Ordering {
    a.nonce
        .cmp(&b.nonce)
        .then_with(|| a.hash().cmp(&b.hash()))
}

/// Hash an ordered transaction sequence.
#[must_use]
pub fn hash_transactions(transactions: &[Transaction]) -> Hash {
    let mut hasher = Blake3Hasher::new();
    for tx in transactions {
        hasher.update(&tx.canonical_bytes());
    }
    hasher.finalize()
}

impl Batch {
    /// Seal a batch: sorts into canonical order, validates bounds, computes
    /// the batch hash.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::Empty`] or [`BatchError::TooLarge`].
    pub fn seal(
        batch_number: u64,
        mut transactions: Vec<Transaction>,
        timestamp: u64,
    ) -> Result<Self, BatchError> {
        if transactions.is_empty() {
            return Err(BatchError::Empty);
        }
        if transactions.len() > MAX_BATCH_TRANSACTIONS {
            return Err(BatchError::TooLarge {
                len: transactions.len(),
                max: MAX_BATCH_TRANSACTIONS,
            });
        }
        transactions.sort_by(canonical_cmp);
        let batch_hash = hash_transactions(&transactions);
        Ok(Self {
            batch_number,
            transactions,
            batch_hash,
            timestamp,
        })
    }

    /// Validate size bounds and canonical ordering of an existing batch.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`BatchError`].
    pub fn validate(&self) -> Result<(), BatchError> {
        if self.transactions.is_empty() {
            return Err(BatchError::Empty);
        }
        if self.transactions.len() > MAX_BATCH_TRANSACTIONS {
            return Err(BatchError::TooLarge {
                len: self.transactions.len(),
                max: MAX_BATCH_TRANSACTIONS,
            });
        }
        for (index, pair) in self.transactions.windows(2).enumerate() {
            if canonical_cmp(&pair[0], &pair[1]) == Ordering::Greater {
                return Err(BatchError::Misordered { index: index + 1 });
            }
        }
        Ok(())
    }

    /// Recompute the hash over the current transaction order.
    #[must_use]
    pub fn compute_hash(&self) -> Hash {
        hash_transactions(&self.transactions)
    }

    /// Number of transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// True when the batch holds no transactions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}
