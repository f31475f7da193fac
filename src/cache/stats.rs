//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and fetch outcomes.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Reads that returned a fresh value
    pub hits: u64,
    /// Reads that returned nothing (absent, stale or malformed)
    pub misses: u64,
    /// Entries deleted because they were read after their window
    pub stale_evictions: u64,
    /// Entries deleted because their record was incomplete or unreadable
    pub malformed_evictions: u64,
    /// Fetch functions invoked on a miss
    pub fetches: u64,
    /// Fetch functions that returned an error
    pub fetch_failures: u64,
    /// Backing store operations that failed
    pub store_errors: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn compute_hit_rate(hits: u64, misses: u64) -> f64 {
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// == Stats Counters ==
/// Live counters shared by every caller of a cache.
#[derive(Debug, Default)]
pub struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_evictions: AtomicU64,
    malformed_evictions: AtomicU64,
    fetches: AtomicU64,
    fetch_failures: AtomicU64,
    store_errors: AtomicU64,
}

impl StatsCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stale_eviction(&self) {
        self.stale_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_eviction(&self) {
        self.malformed_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        CacheStats {
            hits,
            misses,
            stale_evictions: self.stale_evictions.load(Ordering::Relaxed),
            malformed_evictions: self.malformed_evictions.load(Ordering::Relaxed),
            fetches: self.fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            hit_rate: CacheStats::compute_hit_rate(hits, misses),
        }
    }
}
