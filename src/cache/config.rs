//! Cache configuration options

use std::time::Duration;

use crate::cache::EvictionPolicy;

/// Construction parameters for a [`CacheStore`](crate::cache::CacheStore).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// TTL applied by `set`; zero means entries never expire
    pub default_ttl: Duration,
    /// Interval between background sweeps; zero disables the sweep
    pub cleanup_interval: Duration,
    /// Maximum number of entries, 0 = unbounded
    pub max_items: usize,
    /// Victim selection when a new key arrives at capacity
    pub policy: EvictionPolicy,
    /// Whether hit/miss/eviction counters are collected
    pub stats_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(60),
            max_items: 1000,
            policy: EvictionPolicy::Lru,
            stats_enabled: true,
        }
    }
}

impl CacheConfig {
    /// Create a configuration with explicit TTL and sweep interval
    pub fn new(default_ttl: Duration, cleanup_interval: Duration) -> Self {
        Self {
            default_ttl,
            cleanup_interval,
            ..Default::default()
        }
    }

    /// Set the maximum number of entries (0 = unbounded)
    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    /// Set the eviction policy
    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enable or disable statistics collection
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.stats_enabled = enabled;
        self
    }

    /// Returns true when the store has a capacity bound
    pub fn is_bounded(&self) -> bool {
        self.max_items > 0
    }
}
