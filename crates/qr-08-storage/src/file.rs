//! # File Store
//!
//! One file per record under `data_dir/{txs,blocks,proofs}`. Writes land
//! in a temp file first and rename into place, which keeps single-key
//! writes atomic on POSIX filesystems. An exclusive flock on the data
//! directory keeps two nodes from sharing it.

use crate::errors::StorageError;
use crate::traits::RollupStore;
use fs2::FileExt;
use shared_types::Hash;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

const TX_DIR: &str = "txs";
const BLOCK_DIR: &str = "blocks";
const PROOF_DIR: &str = "proofs";
const LOCK_FILE: &str = ".lock";

/// Filesystem-backed store rooted at a data directory.
pub struct FileStore {
    root: PathBuf,
    // Held for the store's lifetime; dropping releases the flock.
    _lock: File,
}

impl FileStore {
    /// Open (creating if needed) a data directory and take its lock.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Locked`] when another process owns the
    /// directory, or an io error.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        for sub in [TX_DIR, BLOCK_DIR, PROOF_DIR] {
            fs::create_dir_all(root.join(sub))?;
        }

        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(root.join(LOCK_FILE))?;
        lock.try_lock_exclusive()
            .map_err(|_| StorageError::Locked)?;

        tracing::info!(root = %root.display(), "opened file store");
        Ok(Self { root, _lock: lock })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }

    fn tx_path(&self, hash: &Hash) -> PathBuf {
        self.root.join(TX_DIR).join(hex::encode(hash))
    }

    fn numbered_path(&self, dir: &str, number: u64) -> PathBuf {
        // Zero-padded so lexicographic directory order equals numeric order.
        self.root.join(dir).join(format!("{number:020}"))
    }
}

impl RollupStore for FileStore {
    fn put_tx(&self, hash: &Hash, bytes: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.tx_path(hash), bytes)
    }

    fn get_tx(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StorageError> {
        Self::read_optional(&self.tx_path(hash))
    }

    fn put_block(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.numbered_path(BLOCK_DIR, number), bytes)
    }

    fn get_block(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError> {
        Self::read_optional(&self.numbered_path(BLOCK_DIR, number))
    }

    fn put_proof(&self, number: u64, bytes: &[u8]) -> Result<(), StorageError> {
        self.write_atomic(&self.numbered_path(PROOF_DIR, number), bytes)
    }

    fn get_proof(&self, number: u64) -> Result<Option<Vec<u8>>, StorageError> {
        Self::read_optional(&self.numbered_path(PROOF_DIR, number))
    }

    fn block_numbers(&self) -> Result<Vec<u64>, StorageError> {
        let mut numbers = Vec::new();
        for entry in fs::read_dir(self.root.join(BLOCK_DIR))? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(".tmp") {
                continue;
            }
            let number = name
                .parse::<u64>()
                .map_err(|_| StorageError::Corrupt(format!("bad block file name {name}")))?;
            numbers.push(number);
        }
        numbers.sort_unstable();
        Ok(numbers)
    }

    fn sync(&self) -> Result<(), StorageError> {
        for sub in [TX_DIR, BLOCK_DIR, PROOF_DIR] {
            File::open(self.root.join(sub))?.sync_all()?;
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
