//! Data models for the proxy
//!
//! Query results and dashboard summaries (the values the cache stores), plus
//! the DTOs used for HTTP request and response bodies.

pub mod query;
pub mod requests;
pub mod responses;
pub mod summary;

// Re-export commonly used types
pub use query::{QueryResult, ResultType, Sample, Series};
pub use requests::{is_valid_metric_name, InstantQuery, RangeQuery};
pub use responses::{
    DeleteResponse, EntryResponse, FlushResponse, HealthResponse, KeysResponse, StatsResponse,
};
pub use summary::{AlertInfo, AlertSummary, CachedValue, MetricsSummary};
