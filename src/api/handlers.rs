//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::info;

use crate::error::{ApiError, Result};
use crate::models::{
    is_valid_metric_name, AlertSummary, DeleteResponse, EntryResponse, FlushResponse,
    HealthResponse, InstantQuery, KeysResponse, MetricsSummary, QueryResult, RangeQuery,
    StatsResponse,
};
use crate::service::{MetricsService, ResponseCache};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MetricsService>,
}

impl AppState {
    /// Creates a new AppState around a service.
    pub fn new(service: MetricsService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Shortcut to the response cache.
    pub fn cache(&self) -> &Arc<ResponseCache> {
        self.service.cache()
    }
}

/// Handler for GET /api/v1/query
///
/// Runs an instant query, served from cache when possible.
pub async fn query_handler(
    State(state): State<AppState>,
    Query(query): Query<InstantQuery>,
) -> Result<Json<Arc<QueryResult>>> {
    if let Some(error_msg) = query.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let result = state.service.instant_query(&query).await?;
    Ok(Json(result))
}

/// Handler for GET /api/v1/query_range
///
/// Runs a range query, served from cache when possible.
pub async fn query_range_handler(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Arc<QueryResult>>> {
    if let Some(error_msg) = query.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let result = state.service.range_query(&query).await?;
    Ok(Json(result))
}

/// Handler for GET /api/v1/summary/:metric
pub async fn summary_handler(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> Result<Json<Arc<MetricsSummary>>> {
    if !is_valid_metric_name(&metric) {
        return Err(ApiError::InvalidRequest(format!(
            "'{}' is not a valid metric name",
            metric
        )));
    }

    let summary = state.service.metrics_summary(&metric).await?;
    Ok(Json(summary))
}

/// Handler for GET /api/v1/alerts
pub async fn alerts_handler(State(state): State<AppState>) -> Result<Json<Arc<AlertSummary>>> {
    let summary = state.service.alert_summary().await?;
    Ok(Json(summary))
}

/// Handler for GET /api/v1/cache/stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let cache = state.cache();
    let config = cache.config();

    Json(StatsResponse::new(cache.stats(), config.max_items, config.policy))
}

/// Handler for GET /api/v1/cache/keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    Json(KeysResponse::new(state.cache().keys()))
}

/// Handler for GET /api/v1/cache/entry/:key
///
/// Returns entry metadata. Counts as a cache read.
pub async fn entry_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<EntryResponse>> {
    let item = state
        .cache()
        .get_item(&key)
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(EntryResponse::new(key, item)))
}

/// Handler for DELETE /api/v1/cache/entry/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache().delete(&key) {
        return Err(ApiError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for DELETE /api/v1/cache
pub async fn flush_handler(State(state): State<AppState>) -> Json<FlushResponse> {
    let removed = state.cache().flush();
    info!("Cache flushed via API, {} entries removed", removed);

    Json(FlushResponse::new(removed))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
