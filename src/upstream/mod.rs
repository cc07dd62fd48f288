//! Upstream Module
//!
//! Query client for the metrics backend.

mod prometheus;
pub mod wire;

use async_trait::async_trait;

use crate::error::UpstreamError;
use crate::models::{InstantQuery, QueryResult, RangeQuery};

pub use prometheus::PrometheusClient;

/// Issues queries against the metrics backend.
///
/// Implementations bound each call with their own timeout and never cache.
#[async_trait]
pub trait QueryClient: Send + Sync {
    /// Evaluates an expression at a single point in time.
    async fn instant_query(&self, query: &InstantQuery) -> Result<QueryResult, UpstreamError>;

    /// Evaluates an expression over a time range.
    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult, UpstreamError>;
}
