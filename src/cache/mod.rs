//! Cache Module
//!
//! Provides in-memory caching with TTL expiration, policy based eviction and
//! a background expiry sweep.

mod config;
mod eviction;
mod item;
mod stats;
mod store;


// Re-export public types
pub use config::CacheConfig;
pub use eviction::{EvictionPolicy, UnknownPolicy};
pub use item::CacheItem;
pub use stats::CacheStats;
pub use store::{CacheStore, EvictionCallback};
