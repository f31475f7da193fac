//! Timed Cache Module
//!
//! Read-through cache with per-entry write timestamps and caller-chosen
//! freshness windows, layered over any [`BackingStore`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use crate::cache::key::validate_key;
use crate::cache::{CacheEntry, CacheStats, Clock, StatsCounters, StoredRecord, SystemClock};
use crate::error::{CacheError, Result};
use crate::store::BackingStore;

// == Timed Cache ==
/// Key/value cache whose entries are judged fresh or stale at read time.
///
/// Nothing is evicted in the background: a stale or malformed entry is
/// deleted when a read finds it.
#[derive(Debug)]
pub struct TimedCache {
    /// Underlying key/value storage
    store: Arc<dyn BackingStore>,
    /// Time source for write stamps and age checks
    clock: Arc<dyn Clock>,
    /// Performance statistics
    stats: StatsCounters,
    /// Treat store failures inside `fetch_with_cache` as misses
    fail_open: bool,
}

impl TimedCache {
    // == Constructor ==
    /// Creates a cache over `store` using the system clock.
    pub fn new(store: Arc<dyn BackingStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock::new()))
    }

    /// Creates a cache over `store` using the given clock.
    pub fn with_clock(store: Arc<dyn BackingStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            stats: StatsCounters::new(),
            fail_open: false,
        }
    }

    /// Sets the fail-open policy for [`fetch_with_cache`](Self::fetch_with_cache).
    ///
    /// When enabled, a store failure while reading is handled as a miss and a
    /// store failure while writing the fetched value is logged and ignored.
    /// Plain `get`, `put` and `invalidate` always report store failures.
    pub fn fail_open(mut self, enabled: bool) -> Self {
        self.fail_open = enabled;
        self
    }

    pub fn is_fail_open(&self) -> bool {
        self.fail_open
    }

    /// Current time according to the cache's clock.
    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The store this cache reads and writes.
    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    // == Get Entry ==
    /// Looks up the fresh entry for `key`.
    ///
    /// Returns `None` when no entry exists. Entries older than `max_age` and
    /// records missing their value or timestamp are deleted before `None` is
    /// returned.
    pub async fn get_entry(&self, key: &str, max_age: Duration) -> Result<Option<CacheEntry>> {
        let entry = self.lookup(key, max_age).await?;
        if entry.is_some() {
            debug!("Cache hit: {}", key);
            self.stats.record_hit();
        }
        Ok(entry)
    }

    // == Get ==
    /// Returns the fresh value stored under `key`, decoded as `T`.
    ///
    /// A stored value that does not decode as `T` is treated as malformed:
    /// it is deleted and `None` is returned.
    pub async fn get<T: DeserializeOwned>(&self, key: &str, max_age: Duration) -> Result<Option<T>> {
        let Some(entry) = self.lookup(key, max_age).await? else {
            return Ok(None);
        };

        match serde_json::from_value(entry.value) {
            Ok(value) => {
                debug!("Cache hit: {}", key);
                self.stats.record_hit();
                Ok(Some(value))
            }
            Err(err) => {
                warn!("Evicting cache entry with unexpected shape: {} ({})", key, err);
                self.evict_malformed(key).await?;
                Ok(None)
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// The full record is handed to the store in one call, replacing any
    /// previous entry for the key.
    pub async fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        validate_key(key)?;

        let value =
            serde_json::to_value(value).map_err(|e| CacheError::Serialization(e.to_string()))?;
        let record = StoredRecord::new(value, self.clock.now_ms());

        self.store_op(self.store.put(key, record).await)?;
        debug!("Cache put: {}", key);
        Ok(())
    }

    // == Invalidate ==
    /// Removes any entry under `key`. Removing an absent key is a no-op.
    pub async fn invalidate(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.store_op(self.store.delete(key).await)?;
        debug!("Cache invalidate: {}", key);
        Ok(())
    }

    // == Fetch With Cache ==
    /// Returns the fresh value for `key`, or runs `fetch` and caches its result.
    ///
    /// `fetch` only runs on a miss. If it fails, its error is returned as is
    /// and nothing is written. Concurrent misses on the same key each run
    /// their own `fetch`; the last write wins.
    pub async fn fetch_with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        max_age: Duration,
        fetch: F,
    ) -> std::result::Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        let cached = match self.get::<T>(key, max_age).await {
            Ok(cached) => cached,
            Err(err) if self.fail_open && err.is_store_unavailable() => {
                warn!("Cache read failed for {}, fetching instead: {}", key, err);
                None
            }
            Err(err) => return Err(err.into()),
        };

        if let Some(value) = cached {
            return Ok(value);
        }

        self.stats.record_fetch();
        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                debug!("Fetch failed for {}, nothing cached", key);
                self.stats.record_fetch_failure();
                return Err(err);
            }
        };

        match self.put(key, &value).await {
            Ok(()) => {}
            Err(err) if self.fail_open && err.is_store_unavailable() => {
                warn!("Cache write failed for {}, returning fetched value: {}", key, err);
            }
            Err(err) => return Err(err.into()),
        }

        Ok(value)
    }

    // == Keys ==
    /// Lists every stored key, fresh or not.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.store_op(self.store.keys().await)
    }

    // == Clear ==
    /// Removes every entry and returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        let removed = self.store_op(self.store.clear().await)?;
        info!("Cache cleared: {} entries removed", removed);
        Ok(removed)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Finds the fresh entry for `key`, deleting stale and malformed records.
    /// Misses are counted here; hits are counted by the caller.
    async fn lookup(&self, key: &str, max_age: Duration) -> Result<Option<CacheEntry>> {
        validate_key(key)?;

        let Some(record) = self.store_op(self.store.get(key).await)? else {
            debug!("Cache miss: {}", key);
            self.stats.record_miss();
            return Ok(None);
        };

        let Some(entry) = record.into_entry(key) else {
            warn!("Evicting malformed cache record: {}", key);
            self.evict_malformed(key).await?;
            return Ok(None);
        };

        let now = self.clock.now_ms();
        if !entry.is_fresh(now, max_age) {
            info!(
                "Evicting stale cache entry: {} (age {}ms > {}ms)",
                key,
                entry.age_ms(now),
                max_age.as_millis()
            );
            self.store_op(self.store.delete(key).await)?;
            self.stats.record_stale_eviction();
            self.stats.record_miss();
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn evict_malformed(&self, key: &str) -> Result<()> {
        self.store_op(self.store.delete(key).await)?;
        self.stats.record_malformed_eviction();
        self.stats.record_miss();
        Ok(())
    }

    fn store_op<T>(&self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.stats.record_store_error();
        }
        result
    }
}
