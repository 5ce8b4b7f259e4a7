//! # Witness Registry
//!
//! Registered witnesses with reliability tracking. The registry sits under
//! one lock; the success/total counters are atomic so vote bookkeeping
//! never blocks readers.

use crate::errors::ConsensusError;
use qr_01_quantum::QState;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use zeroize::Zeroizing;

/// A registered witness.
pub struct WitnessEntry {
    /// Witness identity.
    pub id: String,
    /// Verification key for batch-hash signatures.
    pub public_key: Vec<u8>,
    /// Secret key, present only for witnesses hosted in this process.
    pub secret_key: Option<Zeroizing<Vec<u8>>>,
    /// Amplitude state derived from the public key bytes.
    pub quantum_state: QState,
    successes: AtomicU64,
    total: AtomicU64,
}

impl WitnessEntry {
    /// Reliability score: `successes / total`, 1.0 before any vote.
    #[must_use]
    pub fn reliability(&self) -> f64 {
        let total = self.total.load(Ordering::Relaxed);
        if total == 0 {
            return 1.0;
        }
        self.successes.load(Ordering::Relaxed) as f64 / total as f64
    }

    /// Record a vote verification outcome.
    pub fn record_vote(&self, verified: bool) {
        self.total.fetch_add(1, Ordering::Relaxed);
        if verified {
            self.successes.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Read-only witness snapshot handed to callers.
#[derive(Debug, Clone)]
pub struct WitnessInfo {
    /// Witness identity.
    pub id: String,
    /// Verification key.
    pub public_key: Vec<u8>,
    /// Current reliability score in `[0, 1]`.
    pub reliability: f64,
    /// Verified votes.
    pub successes: u64,
    /// Total votes.
    pub total: u64,
}

/// The witness registry.
#[derive(Default)]
pub struct WitnessRegistry {
    entries: RwLock<BTreeMap<String, Arc<WitnessEntry>>>,
}

impl WitnessRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a remote witness by id and public key.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InvalidRegistration`] for empty inputs.
    pub fn register(&self, id: &str, public_key: Vec<u8>) -> Result<(), ConsensusError> {
        self.register_entry(id, public_key, None)
    }

    /// Register a witness hosted in this process, able to sign locally.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::InvalidRegistration`] for empty inputs.
    pub fn register_local(
        &self,
        id: &str,
        public_key: Vec<u8>,
        secret_key: Vec<u8>,
    ) -> Result<(), ConsensusError> {
        self.register_entry(id, public_key, Some(secret_key))
    }

    fn register_entry(
        &self,
        id: &str,
        public_key: Vec<u8>,
        secret_key: Option<Vec<u8>>,
    ) -> Result<(), ConsensusError> {
        if id.is_empty() || public_key.is_empty() {
            return Err(ConsensusError::InvalidRegistration);
        }
        let quantum_state = QState::from_bytes(&public_key[..public_key.len().min(64)])
            .map_err(|_| ConsensusError::InvalidRegistration)?;

        let entry = Arc::new(WitnessEntry {
            id: id.to_string(),
            public_key,
            secret_key: secret_key.map(Zeroizing::new),
            quantum_state,
            successes: AtomicU64::new(0),
            total: AtomicU64::new(0),
        });
        self.write().insert(id.to_string(), entry);
        Ok(())
    }

    /// Look up a witness entry.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<WitnessEntry>> {
        self.read().get(id).cloned()
    }

    /// Number of registered witnesses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when no witnesses are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Top `count` witnesses by reliability, ties broken by ascending id.
    #[must_use]
    pub fn select_top(&self, count: usize) -> Vec<Arc<WitnessEntry>> {
        let mut entries: Vec<Arc<WitnessEntry>> = self.read().values().cloned().collect();
        // BTreeMap iteration is id-ascending, so a stable sort on the
        // (descending) reliability keeps the id tie-break.
        entries.sort_by(|a, b| {
            b.reliability()
                .partial_cmp(&a.reliability())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        entries.truncate(count);
        entries
    }

    /// Snapshots of every witness.
    #[must_use]
    pub fn snapshots(&self) -> Vec<WitnessInfo> {
        self.read()
            .values()
            .map(|entry| WitnessInfo {
                id: entry.id.clone(),
                public_key: entry.public_key.clone(),
                reliability: entry.reliability(),
                successes: entry.successes.load(Ordering::Relaxed),
                total: entry.total.load(Ordering::Relaxed),
            })
            .collect()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Arc<WitnessEntry>>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, BTreeMap<String, Arc<WitnessEntry>>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }
}

// =============================================================================
// TESTS
// =============================================================================
