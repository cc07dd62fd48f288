//! Cache Statistics Module
//!
//! Tracks hits, misses, evictions and sweep activity.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries evicted due to capacity pressure
    pub evictions: u64,
    /// Number of background sweep passes
    pub cleanup_runs: u64,
    /// Number of expired entries removed, by sweep or on read
    pub expired_deletions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Whether counters are currently being collected
    pub enabled: bool,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Collector ==
/// Live counters owned by the store.
///
/// Counters are only touched while the store lock is held (read or write),
/// and `reset` runs under the write lock, so a reset never interleaves with
/// a half-recorded operation.
#[derive(Debug)]
pub(crate) struct StatsCollector {
    enabled: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    cleanup_runs: AtomicU64,
    expired_deletions: AtomicU64,
}

impl StatsCollector {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            cleanup_runs: AtomicU64::new(0),
            expired_deletions: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn add(&self, counter: &AtomicU64, n: u64) {
        if n > 0 && self.is_enabled() {
            counter.fetch_add(n, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_hit(&self) {
        self.add(&self.hits, 1);
    }

    pub(crate) fn record_miss(&self) {
        self.add(&self.misses, 1);
    }

    pub(crate) fn record_evictions(&self, n: u64) {
        self.add(&self.evictions, n);
    }

    pub(crate) fn record_cleanup_run(&self) {
        self.add(&self.cleanup_runs, 1);
    }

    pub(crate) fn record_expired(&self, n: u64) {
        self.add(&self.expired_deletions, n);
    }

    pub(crate) fn reset(&self) {
        for counter in [
            &self.hits,
            &self.misses,
            &self.evictions,
            &self.cleanup_runs,
            &self.expired_deletions,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            cleanup_runs: self.cleanup_runs.load(Ordering::Relaxed),
            expired_deletions: self.expired_deletions.load(Ordering::Relaxed),
            total_entries,
            enabled: self.is_enabled(),
        }
    }
}
