//! # In-Memory Store
//!
//! Test and light-node adapter; every guarantee of the trait holds
//! trivially except durability, which is a no-op.

use crate::errors::StorageError;
use crate::traits::RollupStore;
use shared_types::Hash;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

#[derive(Default)]
struct MemoryInner {
    txs: HashMap<Hash, Vec<u8>>,
    blocks: BTreeMap<u64, Vec<u8>>,
    proofs: BTreeMap<u64, Vec<u8>>,
}

/// Heap-backed store.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl RollupStore for MemoryStore {
    fn put_tx(&self, hash: &Hash, bytes: &[u8]) -> Result<(), StorageError> {
        self.write().txs.insert(*hash, bytes.to_vec());
        Ok(())
    }

    fn get_tx(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read().txs.get(hash).cloned())
    }

    fn put_block(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError> {
        self.write().blocks.insert(number, bytes.to_vec());
        Ok(())
    }

    fn get_block(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read().blocks.get(&number).cloned())
    }

    fn put_proof(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError> {
        self.write().proofs.insert(number, bytes.to_vec());
        Ok(())
    }

    fn get_proof(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.read().proofs.get(&number).cloned())
    }

    fn block_numbers(&self) -> Result<Vec<u64>, StorageError> {
        Ok(self.read().blocks.keys().copied().collect())
    }

    fn sync(&self) -> Result<(), StorageError> {
        Ok(())
    }
}
