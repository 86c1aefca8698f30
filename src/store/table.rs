//! Store implementation
//!
//! HashMap-based table with RwLock for concurrency.

use std::collections::HashMap;

use parking_lot::RwLock;

/// Thread-safe in-memory key/value table
///
/// Reads (`get`, `exists`, `len`) take the shared lock; writes (`set`, `del`)
/// take the exclusive lock. Every operation completes under a single lock
/// acquisition, which makes each key linearizable.
#[derive(Debug, Default)]
pub struct Store {
    data: RwLock<HashMap<Vec<u8>, Vec<u8>>>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace the value for `key` (write lock)
    pub fn set(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        let key = key.into();
        let value = value.into();
        tracing::trace!(key_len = key.len(), value_len = value.len(), "store set");
        self.data.write().insert(key, value);
    }

    /// Get an owned copy of the value for `key` (read lock)
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    /// Remove `key`, returning whether it was present (write lock)
    pub fn del(&self, key: &[u8]) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Check whether `key` is present (read lock)
    pub fn exists(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }
}
