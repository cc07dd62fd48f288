//! Background Tasks Module
//!
//! The periodic expiry sweep attached to a [`crate::cache::CacheStore`].
//! Started through `CacheStore::start_cleanup` and stopped through
//! `CacheStore::stop`.

mod cleanup;

pub use cleanup::spawn_cleanup_task;
