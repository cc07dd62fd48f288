//! Cache Item Module
//!
//! Defines a single cached value together with its expiry and access metadata.

use std::time::{Duration, Instant};

// == Cache Item ==
/// A cached value with creation, access and expiration timestamps.
///
/// Timestamps are monotonic (`Instant`), so wall-clock adjustments never
/// expire or resurrect entries.
#[derive(Debug, Clone)]
pub struct CacheItem<V> {
    /// The stored value
    value: V,
    /// Absolute expiry instant, None = never expires
    expires_at: Option<Instant>,
    /// When the value was stored (reset on overwrite)
    created_at: Instant,
    /// Last successful read, never earlier than `created_at`
    last_accessed_at: Instant,
    /// Store-wide sequence number taken together with `created_at`
    created_seq: u64,
    /// Store-wide sequence number taken together with `last_accessed_at`
    accessed_seq: u64,
}

impl<V> CacheItem<V> {
    // == Constructor ==
    /// Creates a new item.
    ///
    /// A `ttl` of `None` or zero means the item never expires. A TTL too large
    /// to be represented as an `Instant` is treated the same way.
    pub(crate) fn new(value: V, ttl: Option<Duration>, seq: u64) -> Self {
        let now = Instant::now();
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .and_then(|ttl| now.checked_add(ttl));

        Self {
            value,
            expires_at,
            created_at: now,
            last_accessed_at: now,
            created_seq: seq,
            accessed_seq: seq,
        }
    }

    /// Returns a reference to the stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Consumes the item, returning the stored value.
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the expiry instant, or None if the item never expires.
    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> Instant {
        self.last_accessed_at
    }

    pub(crate) fn created_seq(&self) -> u64 {
        self.created_seq
    }

    pub(crate) fn accessed_seq(&self) -> u64 {
        self.accessed_seq
    }

    // == Is Expired ==
    /// Checks if the item has expired.
    ///
    /// An item is expired once the current time is greater than or equal to
    /// its expiry instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime.
    ///
    /// - `None` if the item never expires
    /// - `Some(Duration::ZERO)` if the item has already expired
    /// - `Some(remaining)` otherwise
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.ttl_remaining_at(Instant::now())
    }

    /// Remaining lifetime measured from `now`.
    ///
    /// Pair with [`CacheItem::is_expired_at`] using the same `now`: a live
    /// item then always reports a non-zero remainder.
    pub(crate) fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }

    /// Time elapsed since the item was stored.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time elapsed since the last successful read.
    pub fn idle_time(&self) -> Duration {
        self.last_accessed_at.elapsed()
    }

    // == Touch ==
    /// Stamps a successful read at `now`.
    pub(crate) fn touch(&mut self, now: Instant, seq: u64) {
        if now > self.last_accessed_at {
            self.last_accessed_at = now;
        }
        self.accessed_seq = seq;
    }
}
