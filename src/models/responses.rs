//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies for the cache
//! administration and health endpoints. Query endpoints return the models in
//! [`crate::models::query`] and [`crate::models::summary`] directly.

use serde::Serialize;

use crate::cache::{CacheItem, CacheStats, EvictionPolicy};
use crate::models::CachedValue;

/// Response body for the stats endpoint (GET /api/v1/cache/stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Configured capacity, 0 = unbounded
    pub max_items: usize,
    pub policy: EvictionPolicy,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a cache statistics snapshot
    pub fn new(stats: CacheStats, max_items: usize, policy: EvictionPolicy) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            max_items,
            policy,
        }
    }
}

/// Response body for GET /api/v1/cache/keys
#[derive(Debug, Clone, Serialize)]
pub struct KeysResponse {
    pub count: usize,
    pub keys: Vec<String>,
}

impl KeysResponse {
    /// Creates a KeysResponse; keys are sorted for stable output
    pub fn new(mut keys: Vec<String>) -> Self {
        keys.sort();
        Self {
            count: keys.len(),
            keys,
        }
    }
}

/// Diagnostics for a single entry (GET /api/v1/cache/entry/:key)
#[derive(Debug, Clone, Serialize)]
pub struct EntryResponse {
    pub key: String,
    /// Which cached payload this is (`query`, `alerts`, `summary`)
    pub kind: &'static str,
    pub age_ms: u64,
    pub idle_ms: u64,
    /// Remaining lifetime, None when the entry never expires
    pub ttl_remaining_ms: Option<u64>,
    pub value: CachedValue,
}

impl EntryResponse {
    pub fn new(key: impl Into<String>, item: CacheItem<CachedValue>) -> Self {
        Self {
            key: key.into(),
            kind: item.value().kind(),
            age_ms: item.age().as_millis() as u64,
            idle_ms: item.idle_time().as_millis() as u64,
            ttl_remaining_ms: item.ttl_remaining().map(|d| d.as_millis() as u64),
            value: item.into_value(),
        }
    }
}

/// Response body for DELETE /api/v1/cache/entry/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /api/v1/cache
#[derive(Debug, Clone, Serialize)]
pub struct FlushResponse {
    pub message: String,
    pub removed: usize,
}

impl FlushResponse {
    pub fn new(removed: usize) -> Self {
        Self {
            message: format!("Flushed {} entries", removed),
            removed,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
