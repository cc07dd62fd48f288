//! API Routes
//!
//! Configures the Axum router with all proxy endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    alerts_handler, delete_handler, entry_handler, flush_handler, health_handler, keys_handler,
    query_handler, query_range_handler, stats_handler, summary_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/v1/query` - Cached instant query
/// - `GET /api/v1/query_range` - Cached range query
/// - `GET /api/v1/summary/:metric` - Aggregated metric summary
/// - `GET /api/v1/alerts` - Active alert summary
/// - `GET /api/v1/cache/stats` - Cache statistics
/// - `GET /api/v1/cache/keys` - Cached keys
/// - `GET|DELETE /api/v1/cache/entry/:key` - Inspect or drop one entry
/// - `DELETE /api/v1/cache` - Flush the cache
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    // Dashboards are served from other origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/query", get(query_handler))
        .route("/api/v1/query_range", get(query_range_handler))
        .route("/api/v1/summary/:metric", get(summary_handler))
        .route("/api/v1/alerts", get(alerts_handler))
        .route("/api/v1/cache", delete(flush_handler))
        .route("/api/v1/cache/stats", get(stats_handler))
        .route("/api/v1/cache/keys", get(keys_handler))
        .route(
            "/api/v1/cache/entry/:key",
            get(entry_handler).delete(delete_handler),
        )
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
