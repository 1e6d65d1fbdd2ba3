//! Backing key/value store for the result cache.
//!
//! The store deals only in strings; encoding, TTL and corruption handling
//! belong to [`ResultCache`](super::ResultCache). Operations are
//! synchronous: a store lookup never suspends the generation task.

use moka::sync::Cache;

use crate::{Result, SproutError};

/// Session-scoped string key/value storage.
pub trait SessionStore: Send + Sync {
    /// Read the raw value for `key`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value`, replacing any existing value.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str);

    /// Delete every key.
    fn clear(&self);
}

/// Default maximum number of entries held by [`MemoryStore`].
pub const DEFAULT_MAX_ENTRIES: u64 = 256;

/// In-memory session store.
///
/// Uses a bounded moka cache so a long session cannot grow without limit;
/// the least recently used entries go first. An optional per-value byte
/// quota makes oversized writes fail the way a browser storage quota does.
pub struct MemoryStore {
    entries: Cache<String, String>,
    max_value_bytes: Option<usize>,
}

impl MemoryStore {
    /// Create a store with the default capacity and no value quota.
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    /// Create a store holding at most `max` entries.
    pub fn with_max_entries(max: u64) -> Self {
        Self {
            entries: Cache::new(max),
            max_value_bytes: None,
        }
    }

    /// Reject values larger than `bytes`.
    pub fn max_value_bytes(mut self, bytes: usize) -> Self {
        self.max_value_bytes = Some(bytes);
        self
    }

    /// Number of entries currently stored.
    ///
    /// Pending moka maintenance is flushed first so the count is exact.
    pub fn len(&self) -> u64 {
        self.entries.run_pending_tasks();
        self.entries.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key))
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        if let Some(limit) = self.max_value_bytes
            && value.len() > limit
        {
            return Err(SproutError::Storage(format!(
                "quota exceeded: {} bytes > {limit}",
                value.len()
            )));
        }
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) {
        self.entries.invalidate(key);
    }

    fn clear(&self) {
        self.entries.invalidate_all();
    }
}
