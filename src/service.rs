//! Metrics Service
//!
//! Cache-aside layer between the HTTP handlers and the upstream query client.
//! The cache lock is only taken for the lookup before an upstream call and
//! the insert after it, never across the call itself.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::cache::CacheStore;
use crate::error::UpstreamError;
use crate::models::{
    AlertSummary, CachedValue, InstantQuery, MetricsSummary, QueryResult, RangeQuery,
};
use crate::upstream::QueryClient;

/// Cache key for the alert summary
pub const ALERTS_KEY: &str = "alerts:summary";

/// Query used to list active alerts
const ALERTS_QUERY: &str = "ALERTS";

/// Cache key for a metric summary
pub fn summary_key(metric: &str) -> String {
    format!("summary:{}", metric)
}

/// Shared response cache type
pub type ResponseCache = CacheStore<CachedValue>;

// == Metrics Service ==
/// Serves dashboard queries from the cache, falling back to the backend.
///
/// Failed upstream lookups are never cached.
pub struct MetricsService {
    cache: Arc<ResponseCache>,
    client: Arc<dyn QueryClient>,
    /// Lookback for metric summaries
    summary_window: Duration,
    /// Resolution for metric summaries
    summary_step: Duration,
}

impl MetricsService {
    pub fn new(cache: Arc<ResponseCache>, client: Arc<dyn QueryClient>) -> Self {
        Self {
            cache,
            client,
            summary_window: Duration::from_secs(3600),
            summary_step: Duration::from_secs(60),
        }
    }

    /// Sets the lookback window and step used by [`MetricsService::metrics_summary`].
    pub fn with_summary_window(mut self, window: Duration, step: Duration) -> Self {
        self.summary_window = window;
        self.summary_step = step;
        self
    }

    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    // == Instant Query ==
    pub async fn instant_query(
        &self,
        query: &InstantQuery,
    ) -> Result<Arc<QueryResult>, UpstreamError> {
        self.get_or_fetch(
            query.cache_key(),
            CachedValue::as_query,
            CachedValue::Query,
            self.client.instant_query(query),
        )
        .await
    }

    // == Range Query ==
    pub async fn range_query(
        &self,
        query: &RangeQuery,
    ) -> Result<Arc<QueryResult>, UpstreamError> {
        self.get_or_fetch(
            query.cache_key(),
            CachedValue::as_query,
            CachedValue::Query,
            self.client.range_query(query),
        )
        .await
    }

    // == Alert Summary ==
    /// Summarises the active alerts reported by the `ALERTS` series.
    pub async fn alert_summary(&self) -> Result<Arc<AlertSummary>, UpstreamError> {
        let fetch = async {
            let result = self
                .client
                .instant_query(&InstantQuery::new(ALERTS_QUERY, None))
                .await?;
            Ok::<_, UpstreamError>(AlertSummary::from_result(&result))
        };

        self.get_or_fetch(
            ALERTS_KEY.to_string(),
            CachedValue::as_alerts,
            CachedValue::Alerts,
            fetch,
        )
        .await
    }

    // == Metrics Summary ==
    /// Aggregates one metric over the summary window ending now.
    ///
    /// `metric` must already be a valid metric name; it is used verbatim as
    /// the query expression.
    pub async fn metrics_summary(
        &self,
        metric: &str,
    ) -> Result<Arc<MetricsSummary>, UpstreamError> {
        let end = unix_now();
        let query = RangeQuery::new(
            metric,
            end - self.summary_window.as_secs_f64(),
            end,
            self.summary_step.as_secs_f64(),
        );

        let fetch = async {
            let result = self.client.range_query(&query).await?;
            Ok::<_, UpstreamError>(MetricsSummary::from_result(metric, &result))
        };

        self.get_or_fetch(
            summary_key(metric),
            CachedValue::as_summary,
            CachedValue::Summary,
            fetch,
        )
        .await
    }

    async fn get_or_fetch<T, Fut>(
        &self,
        key: String,
        extract: fn(&CachedValue) -> Option<Arc<T>>,
        wrap: fn(Arc<T>) -> CachedValue,
        fetch: Fut,
    ) -> Result<Arc<T>, UpstreamError>
    where
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        if let Some(hit) = self.cache.get(&key).as_ref().and_then(extract) {
            debug!(%key, "Cache hit");
            return Ok(hit);
        }

        debug!(%key, "Cache miss, querying upstream");
        let value = match fetch.await {
            Ok(value) => Arc::new(value),
            Err(err) => {
                error!(%key, error = %err, "Upstream query failed");
                return Err(err);
            }
        };

        // A rejected insert still leaves the caller with a good answer
        if let Err(err) = self.cache.set(key.clone(), wrap(value.clone())) {
            warn!(%key, error = %err, "Upstream result was not cached");
        }

        Ok(value)
    }
}

fn unix_now() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
