//! TTL-bounded recipe cache.
//!
//! [`ResultCache`] maps a [`CacheKey`] to the last recipe generated for it,
//! stored as JSON `{"recipe": {...}, "timestamp": <ms>}` in a
//! [`SessionStore`]. Expiry is checked lazily on read: an entry whose age
//! has reached the TTL is deleted and reported as a miss.
//!
//! Caching is an optimisation only. Corrupt entries are deleted and treated
//! as misses, and failed writes are logged and dropped. Neither reaches the
//! caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::key::CacheKey;
use super::store::{DEFAULT_MAX_ENTRIES, MemoryStore, SessionStore};
use crate::clock::{Clock, SystemClock};
use crate::telemetry;
use crate::types::Recipe;

/// Default time-to-live for cached recipes: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Configuration for the result cache.
///
/// ```rust
/// # use sprout::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(64)
///     .ttl(Duration::from_secs(600));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Time-to-live for cached entries. Default: 1 hour.
    pub ttl: Duration,
    /// Maximum entries for the default in-memory store. Default: 256.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the time-to-live for cached entries.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries in the default store.
    pub fn max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }
}

/// A cached recipe and the time it was written (ms since the Unix epoch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub recipe: Recipe,
    pub timestamp: u64,
}

/// Recipe cache over a session store.
pub struct ResultCache {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ResultCache {
    /// Cache over a fresh [`MemoryStore`] and the system clock.
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_parts(
            config,
            Arc::new(MemoryStore::with_max_entries(config.max_entries)),
            Arc::new(SystemClock),
        )
    }

    /// Cache over an explicit store and clock.
    pub fn with_parts(
        config: &CacheConfig,
        store: Arc<dyn SessionStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            clock,
            ttl: config.ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up an unexpired entry.
    ///
    /// Expired, undecodable and incomplete entries are deleted and reported
    /// as `None`.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        let raw = match self.store.get(key.as_str()) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.record_miss();
                return None;
            }
            Err(e) => {
                warn!(%key, error = %e, "recipe cache read failed");
                self.record_miss();
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(%key, error = %e, "discarding corrupt recipe cache entry");
                self.evict(key, "corrupt");
                return None;
            }
        };

        let missing = entry.recipe.missing_fields();
        if !missing.is_empty() {
            warn!(%key, ?missing, "discarding recipe cache entry with blank fields");
            self.evict(key, "corrupt");
            return None;
        }

        let age_ms = self.clock.now_ms().saturating_sub(entry.timestamp);
        if u128::from(age_ms) >= self.ttl.as_millis() {
            debug!(%key, age_ms, "recipe cache entry expired");
            self.evict(key, "expired");
            return None;
        }

        metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
        debug!(%key, age_ms, "recipe cache hit");
        Some(entry)
    }

    /// Store `recipe` under `key` with the current time, replacing any
    /// existing entry. Failures are logged and swallowed.
    pub fn set(&self, key: &CacheKey, recipe: &Recipe) {
        let entry = CacheEntry {
            recipe: recipe.clone(),
            timestamp: self.clock.now_ms(),
        };
        let encoded = match serde_json::to_string(&entry) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(%key, error = %e, "failed to encode recipe cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(key.as_str(), encoded) {
            warn!(%key, error = %e, "failed to write recipe cache entry");
            return;
        }
        debug!(%key, "recipe cached");
    }

    /// Delete the entry for `key`, if any.
    pub fn remove(&self, key: &CacheKey) {
        self.store.remove(key.as_str());
    }

    /// Delete every entry in the backing store.
    pub fn clear(&self) {
        self.store.clear();
    }

    fn evict(&self, key: &CacheKey, reason: &'static str) {
        self.store.remove(key.as_str());
        metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => reason).increment(1);
        self.record_miss();
    }

    fn record_miss(&self) {
        metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
    }
}
