//! In-memory TTL cache with producer fallback.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use marketfeed_core::constants::{CACHE_TTL, DEFAULT_MAX_CACHE_ENTRIES};
use marketfeed_core::error::Result;

/// Cached value with the instant it was produced.
#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Cache configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_entries: usize,
    /// TTL in seconds used by housekeeping and statistics
    pub default_ttl_seconds: u64,
    /// Whether concurrent misses on one key share a single producer call
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_CACHE_ENTRIES,
            default_ttl_seconds: CACHE_TTL.as_secs(),
            single_flight: true,
        }
    }
}

impl CacheConfig {
    fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_seconds)
    }
}

/// In-memory cache keyed by feed name.
///
/// Thread-safe. Freshness is decided per call: an entry is served while
/// `now - fetched_at < ttl`, otherwise the supplied producer runs and its result
/// replaces the entry. A failed producer never writes.
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    /// Per-key locks serializing producer calls when single-flight is on
    flights: DashMap<String, Arc<AsyncMutex<()>>>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    producer_failures: AtomicU64,
}

impl<V: Clone + Send + Sync> TtlCache<V> {
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(config.max_entries.min(64))),
            flights: DashMap::new(),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            producer_failures: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the cached value for `key`, computing it if missing or stale.
    ///
    /// The producer is awaited outside of any cache lock. Its error is returned
    /// unchanged and leaves the previous entry (fresh or not) in place.
    pub async fn get_or_compute<F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(value) = self.lookup(key, ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache hit");
            return Ok(value);
        }

        if !self.config.single_flight {
            return self.compute(key, producer).await;
        }

        let flight = self
            .flights
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();
        let _guard = flight.lock().await;

        // Another caller may have filled the entry while we waited
        if let Some(value) = self.lookup(key, ttl) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache hit after waiting on in-flight producer");
            return Ok(value);
        }

        self.compute(key, producer).await
    }

    async fn compute<F, Fut>(&self, key: &str, producer: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key, "Cache miss, invoking producer");

        match producer().await {
            Ok(value) => {
                self.insert(key, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.producer_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key, error = %err, "Producer failed, cache entry left untouched");
                Err(err)
            }
        }
    }

    fn lookup(&self, key: &str, ttl: Duration) -> Option<V> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| entry.is_fresh(ttl))
            .map(|entry| entry.value.clone())
    }

    /// Gets a cached value if it is younger than `ttl`.
    ///
    /// Never invokes a producer.
    pub fn get(&self, key: &str, ttl: Duration) -> Option<V> {
        self.lookup(key, ttl)
    }

    /// Stores a value, stamping it with the current instant.
    pub fn insert(&self, key: &str, value: V) {
        let mut entries = self.entries.write();

        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            let ttl = self.config.default_ttl();
            entries.retain(|_, entry| entry.is_fresh(ttl));
        }

        // Still at capacity? Remove oldest entry
        if entries.len() >= self.config.max_entries && !entries.contains_key(key) {
            if let Some(oldest_key) = entries
                .iter()
                .min_by_key(|(_, e)| e.fetched_at)
                .map(|(k, _)| k.clone())
            {
                debug!(key = %oldest_key, "Evicting oldest cache entry");
                entries.remove(&oldest_key);
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Removes a cached entry so the next call recomputes it.
    pub fn invalidate(&self, key: &str) {
        self.entries.write().remove(key);
        self.flights.remove(key);
    }

    /// Clears all cached entries.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.flights.clear();
    }

    /// Removes all entries older than `ttl`.
    pub fn cleanup_expired(&self, ttl: Duration) {
        self.entries.write().retain(|_, entry| entry.is_fresh(ttl));
    }

    /// Returns the number of cached entries (including stale ones).
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns cache statistics, judging freshness by the configured default TTL.
    pub fn stats(&self) -> CacheStats {
        let ttl = self.config.default_ttl();
        let entries = self.entries.read();
        let fresh = entries.values().filter(|e| e.is_fresh(ttl)).count();

        CacheStats {
            total_entries: entries.len(),
            fresh_entries: fresh,
            expired_entries: entries.len() - fresh,
            capacity: self.config.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            producer_failures: self.producer_failures.load(Ordering::Relaxed),
        }
    }
}

impl<V: Clone + Send + Sync> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total entries (including expired)
    pub total_entries: usize,
    /// Entries younger than the default TTL
    pub fresh_entries: usize,
    /// Entries at or past the default TTL
    pub expired_entries: usize,
    /// Maximum capacity
    pub capacity: usize,
    /// Calls served from the cache
    pub hits: u64,
    /// Calls that invoked a producer
    pub misses: u64,
    /// Producer calls that failed
    pub producer_failures: u64,
}
