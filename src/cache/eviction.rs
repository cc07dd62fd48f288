//! Eviction Policy Module
//!
//! Chooses which entries to drop when the store is at capacity.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::Serialize;

use crate::cache::CacheItem;
use crate::error::CacheError;

// == Eviction Policy ==
/// Victim selection strategy used when a new key arrives at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvictionPolicy {
    /// Least recently read entry goes first
    #[default]
    Lru,
    /// Earliest stored entry goes first; reads do not matter
    Oldest,
    /// Least frequently used. Accepted as configuration but not implemented:
    /// any eviction under this policy fails.
    Lfu,
}

impl EvictionPolicy {
    // == Select Victims ==
    /// Picks up to `count` keys to evict, in eviction order.
    ///
    /// Candidates are ordered by the policy timestamp (`last_accessed_at` for
    /// LRU, `created_at` for Oldest). Entries with identical timestamps are
    /// ordered by the store sequence number taken with that timestamp, so the
    /// earlier write or read loses.
    pub fn select_victims<V>(
        &self,
        entries: &HashMap<String, CacheItem<V>>,
        count: usize,
    ) -> Result<Vec<String>, CacheError> {
        let stamp: fn(&CacheItem<V>) -> (Instant, u64) = match self {
            EvictionPolicy::Lru => |item| (item.last_accessed_at(), item.accessed_seq()),
            EvictionPolicy::Oldest => |item| (item.created_at(), item.created_seq()),
            EvictionPolicy::Lfu => return Err(CacheError::UnsupportedPolicy(*self)),
        };

        let mut candidates: Vec<((Instant, u64), &String)> = entries
            .iter()
            .map(|(key, item)| (stamp(item), key))
            .collect();
        candidates.sort_unstable_by_key(|(order, _)| *order);

        Ok(candidates
            .into_iter()
            .take(count)
            .map(|(_, key)| key.clone())
            .collect())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Oldest => "OLDEST",
            EvictionPolicy::Lfu => "LFU",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown policy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown eviction policy '{0}' (expected LRU, OLDEST or LFU)")]
pub struct UnknownPolicy(pub String);

impl FromStr for EvictionPolicy {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LRU" => Ok(EvictionPolicy::Lru),
            "OLDEST" => Ok(EvictionPolicy::Oldest),
            "LFU" => Ok(EvictionPolicy::Lfu),
            _ => Err(UnknownPolicy(s.to_string())),
        }
    }
}
