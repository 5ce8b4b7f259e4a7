//! # Store Interface
//!
//! Guarantees required of every adapter: atomic single-key writes,
//! durability after `sync`, and block iteration ordered by number.

use crate::errors::StorageError;
use shared_types::Hash;

/// Persistent rollup storage.
pub trait RollupStore: Send + Sync {
    /// Store a serialized transaction under its hash.
    fn put_tx(&self, hash: &Hash, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetch a serialized transaction by hash.
    fn get_tx(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a serialized block under its number.
    fn put_block(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetch a serialized block by number.
    fn get_block(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a serialized proof under its batch number.
    fn put_proof(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError>;

    /// Fetch a serialized proof by batch number.
    fn get_proof(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError>;

    /// All stored block numbers, ascending.
    fn block_numbers(&self) -> Result<Vec<u64>, StorageError>;

    /// Flush everything to durable media.
    fn sync(&self) -> Result<(), StorageError>;
}
