//! TTL Cleanup Task
//!
//! Background task that periodically removes expired cache entries.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task ends when `stop_rx` fires (or its sender is dropped), or when the
/// store itself has been dropped. Each pass takes the store write lock only
/// for the duration of the sweep. A pass that panics, for instance inside
/// the eviction callback, is logged and the next tick runs as usual.
///
/// Usually started through [`CacheStore::start_cleanup`], which keeps the
/// stop sender.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(CacheStore::<String>::new(CacheConfig::default()));
/// cache.start_cleanup();
/// // Later, during shutdown:
/// cache.stop();
/// ```
pub fn spawn_cleanup_task<V>(
    cache: Weak<CacheStore<V>>,
    interval: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) -> JoinHandle<()>
where
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {}ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    info!("TTL cleanup task stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let Some(cache) = cache.upgrade() else {
                        debug!("Cache store dropped, ending TTL cleanup task");
                        break;
                    };

                    match panic::catch_unwind(AssertUnwindSafe(|| cache.delete_expired())) {
                        Ok(0) => debug!("TTL cleanup: no expired entries found"),
                        Ok(removed) => info!("TTL cleanup: removed {} expired entries", removed),
                        Err(_) => error!("TTL cleanup pass panicked, continuing on next tick"),
                    }
                }
            }
        }
    })
}
