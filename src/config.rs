//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::cache::{CacheConfig, EvictionPolicy, UnknownPolicy};

/// Errors raised while loading configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("CACHE_EVICTION_POLICY: {0}")]
    InvalidPolicy(#[from] UnknownPolicy),
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Base URL of the Prometheus-compatible backend
    pub prometheus_url: String,
    /// Upstream request timeout in seconds
    pub upstream_timeout: u64,
    /// Default TTL in seconds for cached responses (0 = never expires)
    pub cache_default_ttl: u64,
    /// Background cleanup task interval in seconds (0 = disabled)
    pub cache_cleanup_interval: u64,
    /// Maximum number of cached responses (0 = unbounded)
    pub cache_max_items: usize,
    /// Eviction policy applied at capacity
    pub cache_eviction_policy: EvictionPolicy,
    /// Whether cache statistics are collected
    pub cache_stats_enabled: bool,
    /// Lookback window in seconds for metric summaries
    pub summary_window: u64,
    /// Step in seconds for metric summaries
    pub summary_step: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8080)
    /// - `PROMETHEUS_URL` - Upstream base URL (default: http://localhost:9090)
    /// - `UPSTREAM_TIMEOUT` - Upstream timeout in seconds (default: 10)
    /// - `CACHE_DEFAULT_TTL` - Default TTL in seconds (default: 30)
    /// - `CACHE_CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `CACHE_MAX_ITEMS` - Maximum cache entries (default: 1000)
    /// - `CACHE_EVICTION_POLICY` - `LRU`, `OLDEST` or `LFU` (default: LRU)
    /// - `CACHE_STATS_ENABLED` - `true`/`false` (default: true)
    /// - `SUMMARY_WINDOW` - Summary lookback in seconds (default: 3600)
    /// - `SUMMARY_STEP` - Summary step in seconds (default: 60)
    ///
    /// Unparseable numbers fall back to their defaults; an unknown eviction
    /// policy is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cache_eviction_policy = match lookup("CACHE_EVICTION_POLICY") {
            Some(raw) => EvictionPolicy::from_str(&raw)?,
            None => defaults.cache_eviction_policy,
        };

        Ok(Self {
            server_port: parse_or(&lookup, "SERVER_PORT", defaults.server_port),
            prometheus_url: lookup("PROMETHEUS_URL").unwrap_or(defaults.prometheus_url),
            upstream_timeout: parse_or(&lookup, "UPSTREAM_TIMEOUT", defaults.upstream_timeout),
            cache_default_ttl: parse_or(&lookup, "CACHE_DEFAULT_TTL", defaults.cache_default_ttl),
            cache_cleanup_interval: parse_or(
                &lookup,
                "CACHE_CLEANUP_INTERVAL",
                defaults.cache_cleanup_interval,
            ),
            cache_max_items: parse_or(&lookup, "CACHE_MAX_ITEMS", defaults.cache_max_items),
            cache_eviction_policy,
            cache_stats_enabled: parse_or(
                &lookup,
                "CACHE_STATS_ENABLED",
                defaults.cache_stats_enabled,
            ),
            summary_window: parse_or(&lookup, "SUMMARY_WINDOW", defaults.summary_window),
            summary_step: parse_or(&lookup, "SUMMARY_STEP", defaults.summary_step),
        })
    }

    /// Cache construction parameters derived from this configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new(
            Duration::from_secs(self.cache_default_ttl),
            Duration::from_secs(self.cache_cleanup_interval),
        )
        .with_max_items(self.cache_max_items)
        .with_policy(self.cache_eviction_policy)
        .with_stats(self.cache_stats_enabled)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8080,
            prometheus_url: "http://localhost:9090".to_string(),
            upstream_timeout: 10,
            cache_default_ttl: 30,
            cache_cleanup_interval: 60,
            cache_max_items: 1000,
            cache_eviction_policy: EvictionPolicy::Lru,
            cache_stats_enabled: true,
            summary_window: 3600,
            summary_step: 60,
        }
    }
}
