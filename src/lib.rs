//! Metrics Proxy - a caching front for a Prometheus-compatible backend
//!
//! Dashboard queries are answered from an in-memory TTL cache with bounded
//! capacity and pluggable eviction, falling back to the backend on a miss.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tasks;
pub mod upstream;

pub use api::{create_router, AppState};
pub use cache::{CacheConfig, CacheStore, EvictionPolicy};
pub use config::Config;
pub use service::{MetricsService, ResponseCache};
pub use upstream::{PrometheusClient, QueryClient};
