//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with TTL expiration, policy
//! based eviction and an optional background sweep.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::stats::StatsCollector;
use crate::cache::{CacheConfig, CacheItem, CacheStats};
use crate::error::CacheError;
use crate::tasks::spawn_cleanup_task;

/// Hook invoked with every entry removed by eviction, deletion, flush or expiry.
pub type EvictionCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

/// Handle on a running sweep task.
struct Sweeper {
    stop_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Outcome of the read-locked half of a lookup.
enum Lookup<V> {
    Hit(CacheItem<V>),
    Expired,
    Missing,
}

// == Cache Store ==
/// Thread-safe TTL cache with size-bounded eviction.
///
/// All operations take `&self`; share the store through an `Arc`. Eviction
/// callbacks run after the store lock has been released, so a callback may
/// call back into the store.
pub struct CacheStore<V> {
    /// Key-value storage
    entries: RwLock<HashMap<String, CacheItem<V>>>,
    /// Performance statistics
    stats: StatsCollector,
    config: CacheConfig,
    on_evict: Option<EvictionCallback<V>>,
    /// Monotonic stamp for deterministic ordering of equal timestamps
    seq: AtomicU64,
    /// Stop signal and handle of the sweep task, if one was started
    sweeper: Mutex<Option<Sweeper>>,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new store. The background sweep is not started.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            stats: StatsCollector::new(config.stats_enabled),
            config,
            on_evict: None,
            seq: AtomicU64::new(0),
            sweeper: Mutex::new(None),
        }
    }

    /// Creates a new store that reports every removed entry to `callback`.
    pub fn with_eviction_callback<F>(config: CacheConfig, callback: F) -> Self
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        let mut store = Self::new(config);
        store.on_evict = Some(Arc::new(callback));
        store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    fn notify_removed(&self, removed: Vec<(String, V)>) {
        if let Some(callback) = &self.on_evict {
            for (key, value) in &removed {
                callback(key, value);
            }
        }
    }

    // == Set ==
    /// Stores a value with the configured default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) -> Result<(), CacheError> {
        self.set_with_expiration(key, value, self.config.default_ttl)
    }

    // == Set With Expiration ==
    /// Stores a value that expires after `ttl`; a zero `ttl` never expires.
    ///
    /// Overwriting an existing key replaces its value and resets its
    /// timestamps without evicting anything. A new key arriving at capacity
    /// evicts exactly one entry first; if the policy cannot choose a victim
    /// the error is returned and nothing is inserted.
    pub fn set_with_expiration(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = key.into();
        let mut evicted = Vec::new();

        {
            let mut entries = self.entries.write();

            if self.config.is_bounded()
                && entries.len() >= self.config.max_items
                && !entries.contains_key(&key)
            {
                let victims = self.config.policy.select_victims(&entries, 1)?;
                for victim in victims {
                    if let Some(item) = entries.remove(&victim) {
                        evicted.push((victim, item.into_value()));
                    }
                }
                self.stats.record_evictions(evicted.len() as u64);
            }

            let item = CacheItem::new(value, Some(ttl), self.next_seq());
            entries.insert(key, item);
        }

        if !evicted.is_empty() {
            debug!(
                policy = %self.config.policy,
                keys = ?evicted.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>(),
                "Evicted entries at capacity"
            );
        }
        self.notify_removed(evicted);
        Ok(())
    }

    // == Get Item ==
    /// Retrieves an entry with its metadata.
    ///
    /// Returns None if the key is absent or expired. An expired entry found
    /// here is removed immediately. A hit refreshes the access time.
    pub fn get_item(&self, key: &str) -> Option<CacheItem<V>>
    where
        V: Clone,
    {
        match self.lookup(key) {
            Lookup::Hit(mut item) => {
                self.restamp(key, &mut item);
                Some(item)
            }
            Lookup::Expired => {
                self.remove_if_expired(key);
                None
            }
            Lookup::Missing => None,
        }
    }

    /// Read-locked half of a lookup. Records the hit or miss.
    fn lookup(&self, key: &str) -> Lookup<V>
    where
        V: Clone,
    {
        let entries = self.entries.read();
        match entries.get(key) {
            Some(item) if !item.is_expired() => {
                self.stats.record_hit();
                Lookup::Hit(item.clone())
            }
            Some(_) => {
                self.stats.record_miss();
                Lookup::Expired
            }
            None => {
                self.stats.record_miss();
                Lookup::Missing
            }
        }
    }

    /// Write-locked half of a hit: stamps the access on the stored entry and
    /// on `item`. Returns false if the entry was deleted or replaced since
    /// `item` was read, in which case nothing changes.
    fn restamp(&self, key: &str, item: &mut CacheItem<V>) -> bool {
        let mut entries = self.entries.write();
        match entries.get_mut(key) {
            Some(current) if current.created_seq() == item.created_seq() => {
                let now = Instant::now();
                let seq = self.next_seq();
                current.touch(now, seq);
                item.touch(now, seq);
                true
            }
            _ => false,
        }
    }

    // == Get ==
    /// Retrieves a value by key. See [`CacheStore::get_item`].
    pub fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.get_item(key).map(CacheItem::into_value)
    }

    fn remove_if_expired(&self, key: &str) {
        let removed = {
            let mut entries = self.entries.write();
            let expired = entries
                .get(key)
                .is_some_and(|item| item.is_expired());
            if expired {
                self.stats.record_expired(1);
                entries.remove(key)
            } else {
                None
            }
        };

        if let Some(item) = removed {
            self.notify_removed(vec![(key.to_string(), item.into_value())]);
        }
    }

    // == Has ==
    /// Returns true if the key is present and not expired.
    ///
    /// Does not touch access time or statistics.
    pub fn has(&self, key: &str) -> bool {
        self.entries
            .read()
            .get(key)
            .is_some_and(|item| !item.is_expired())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it existed.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.entries.write().remove(key);

        match removed {
            Some(item) => {
                self.notify_removed(vec![(key.to_string(), item.into_value())]);
                true
            }
            None => false,
        }
    }

    // == Flush ==
    /// Removes every entry, expired or not. Returns the number removed.
    pub fn flush(&self) -> usize {
        let drained = std::mem::take(&mut *self.entries.write());
        let count = drained.len();

        self.notify_removed(
            drained
                .into_iter()
                .map(|(key, item)| (key, item.into_value()))
                .collect(),
        );
        count
    }

    // == TTL ==
    /// Returns the remaining lifetime of a live entry.
    ///
    /// `None` if the key is absent or expired; `Some(Duration::ZERO)` if the
    /// entry never expires.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read();
        let now = Instant::now();
        let item = entries.get(key).filter(|item| !item.is_expired_at(now))?;
        Some(item.ttl_remaining_at(now).unwrap_or(Duration::ZERO))
    }

    // == Count ==
    /// Returns the number of stored entries, including expired entries that
    /// have not been removed yet.
    pub fn count(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns all stored keys in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().keys().cloned().collect()
    }

    // == Delete Expired ==
    /// Removes all expired entries. This is one sweep pass.
    ///
    /// Returns the number of entries removed.
    pub fn delete_expired(&self) -> usize {
        let removed: Vec<(String, V)> = {
            let mut entries = self.entries.write();
            let now = Instant::now();
            let expired_keys: Vec<String> = entries
                .iter()
                .filter(|(_, item)| item.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            let removed: Vec<(String, V)> = expired_keys
                .into_iter()
                .filter_map(|key| {
                    let item = entries.remove(&key)?;
                    Some((key, item.into_value()))
                })
                .collect();

            self.stats.record_cleanup_run();
            self.stats.record_expired(removed.len() as u64);
            removed
        };

        let count = removed.len();
        self.notify_removed(removed);
        count
    }

    // == Stats ==
    /// Returns a snapshot of the statistics counters.
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();
        self.stats.snapshot(entries.len())
    }

    pub fn stats_enabled(&self) -> bool {
        self.stats.is_enabled()
    }

    /// Resumes counter collection. Existing counts are kept.
    pub fn enable_stats(&self) {
        self.stats.set_enabled(true);
    }

    /// Pauses counter collection. Existing counts are kept.
    pub fn disable_stats(&self) {
        self.stats.set_enabled(false);
    }

    /// Zeroes all counters.
    pub fn reset_stats(&self) {
        let _entries = self.entries.write();
        self.stats.reset();
    }

    // == Stop ==
    /// Signals the background sweep to stop.
    ///
    /// Safe to call repeatedly and when the sweep was never started.
    pub fn stop(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            // The task may already be gone with its receiver
            let _ = sweeper.stop_tx.send(());
            info!("Cache cleanup task stop requested");
        }
    }

    /// Returns true while a sweep task is running for this store.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|sweeper| !sweeper.handle.is_finished())
    }
}

impl<V: Send + Sync + 'static> CacheStore<V> {
    // == Start Cleanup ==
    /// Starts the background sweep on the current tokio runtime.
    ///
    /// Returns false if a sweep is already running or the configured interval
    /// is zero. A sweep task that has ended is replaced. The task only holds
    /// a weak reference, so dropping the last `Arc` also ends it.
    pub fn start_cleanup(self: &Arc<Self>) -> bool {
        let interval = self.config.cleanup_interval;
        if interval.is_zero() {
            return false;
        }

        let mut sweeper = self.sweeper.lock();
        if sweeper
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
        {
            return false;
        }

        let (stop_tx, stop_rx) = oneshot::channel();
        let handle = spawn_cleanup_task(Arc::downgrade(self), interval, stop_rx);
        *sweeper = Some(Sweeper { stop_tx, handle });
        true
    }
}

impl<V> Drop for CacheStore<V> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("entries", &self.entries.read().len())
            .field("config", &self.config)
            .field("has_callback", &self.on_evict.is_some())
            .finish()
    }
}
