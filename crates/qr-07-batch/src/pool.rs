//! # Executor Pool
//!
//! A fixed pool of executor leases shared across workers. Checkout blocks
//! until a lease frees up, bounding concurrent EVM executions.

use std::sync::{Arc, Condvar, Mutex};

struct PoolState {
    available: usize,
}

/// Bounded pool of executor leases.
pub struct ExecutorPool {
    state: Mutex<PoolState>,
    freed: Condvar,
    capacity: usize,
}

impl ExecutorPool {
    /// Pool with `capacity` concurrent leases (minimum 1).
    #[must_use]
    pub fn new(capacity: usize) -> Arc<Self> {
        let capacity = capacity.max(1);
        Arc::new(Self {
            state: Mutex::new(PoolState {
                available: capacity,
            }),
            freed: Condvar::new(),
            capacity,
        })
    }

    /// Total leases.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Leases currently free.
    #[must_use]
    pub fn available(&self) -> usize {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).available
    }

    /// Borrow a lease, blocking until one frees up.
    #[must_use]
    pub fn checkout(self: &Arc<Self>) -> ExecutorLease {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        while state.available == 0 {
            state = self
                .freed
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
        state.available -= 1;
        ExecutorLease {
            pool: Arc::clone(self),
        }
    }
}

/// A borrowed executor slot; returned to the pool on drop.
pub struct ExecutorLease {
    pool: Arc<ExecutorPool>,
}

impl Drop for ExecutorLease {
    fn drop(&mut self) {
        let mut state = self
            .pool
            .state
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        state.available += 1;
        self.pool.freed.notify_one();
    }
}
