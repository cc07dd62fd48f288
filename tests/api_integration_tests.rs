//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint against an in-process
//! fake backend.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use metrics_proxy::{
    cache::{CacheConfig, CacheStore, EvictionPolicy},
    create_router,
    error::UpstreamError,
    models::{InstantQuery, QueryResult, RangeQuery, ResultType, Sample, Series},
    AppState, MetricsService, QueryClient, ResponseCache,
};
use serde_json::Value;
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

// == Fake Backend ==

#[derive(Default)]
struct FakeBackend {
    calls: AtomicUsize,
    down: AtomicBool,
}

impl FakeBackend {
    fn answer(
        &self,
        labels: &[(&str, &str)],
        values: &[f64],
    ) -> Result<QueryResult, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            return Err(UpstreamError::Query {
                error_type: "internal".to_string(),
                message: "storage shard 7 unavailable".to_string(),
            });
        }

        let metric: BTreeMap<String, String> = labels
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let samples = values
            .iter()
            .enumerate()
            .map(|(i, value)| Sample {
                timestamp: 1_700_000_000.0 + i as f64 * 60.0,
                value: *value,
            })
            .collect();

        Ok(QueryResult {
            result_type: if values.len() > 1 {
                ResultType::Matrix
            } else {
                ResultType::Vector
            },
            series: vec![Series { metric, samples }],
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueryClient for FakeBackend {
    async fn instant_query(&self, query: &InstantQuery) -> Result<QueryResult, UpstreamError> {
        if query.query == "ALERTS" {
            return self.answer(
                &[
                    ("__name__", "ALERTS"),
                    ("alertname", "HighLatency"),
                    ("alertstate", "firing"),
                    ("severity", "critical"),
                ],
                &[1.0],
            );
        }
        self.answer(&[("__name__", query.query.as_str())], &[1.0])
    }

    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult, UpstreamError> {
        self.answer(&[("__name__", query.query.as_str())], &[3.0, 1.0, 2.0])
    }
}

// == Helper Functions ==

struct TestApp {
    router: Router,
    backend: Arc<FakeBackend>,
    cache: Arc<ResponseCache>,
}

fn create_test_app_with(config: CacheConfig) -> TestApp {
    let backend = Arc::new(FakeBackend::default());
    let cache = Arc::new(CacheStore::new(config));
    let service = MetricsService::new(cache.clone(), backend.clone());

    TestApp {
        router: create_router(AppState::new(service)),
        backend,
        cache,
    }
}

fn create_test_app() -> TestApp {
    create_test_app_with(CacheConfig::default())
}

async fn send(app: &TestApp, method: &str, uri: &str) -> Response {
    app.router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Query Endpoint Tests ==

#[tokio::test]
async fn test_query_miss_then_hit() {
    let app = create_test_app();

    let first = send(&app, "GET", "/api/v1/query?query=up&time=1700000000").await;
    assert_eq!(first.status(), StatusCode::OK);
    let first = body_to_json(first).await;

    let second = send(&app, "GET", "/api/v1/query?query=up&time=1700000000").await;
    assert_eq!(second.status(), StatusCode::OK);
    let second = body_to_json(second).await;

    assert_eq!(first, second);
    assert_eq!(first["resultType"], "vector");
    assert_eq!(first["series"][0]["metric"]["__name__"], "up");
    assert_eq!(app.backend.calls(), 1);

    let stats = app.cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_query_different_time_is_different_entry() {
    let app = create_test_app();

    send(&app, "GET", "/api/v1/query?query=up&time=1").await;
    send(&app, "GET", "/api/v1/query?query=up&time=2").await;

    assert_eq!(app.backend.calls(), 2);
    assert_eq!(app.cache.count(), 2);
}

#[tokio::test]
async fn test_query_empty_expression_rejected() {
    let app = create_test_app();

    let response = send(&app, "GET", "/api/v1/query?query=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
    assert_eq!(app.backend.calls(), 0);
}

#[tokio::test]
async fn test_upstream_failure_is_bad_gateway_and_not_cached() {
    let app = create_test_app();
    app.backend.down.store(true, Ordering::SeqCst);

    let response = send(&app, "GET", "/api/v1/query?query=up").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_to_json(response).await;
    let message = json["error"].as_str().unwrap();
    assert!(!message.contains("shard"), "backend detail leaked: {}", message);
    assert!(app.cache.is_empty());

    app.backend.down.store(false, Ordering::SeqCst);
    let response = send(&app, "GET", "/api/v1/query?query=up").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(app.backend.calls(), 2);
}

// == Range Query Endpoint Tests ==

#[tokio::test]
async fn test_query_range_success() {
    let app = create_test_app();

    let response = send(
        &app,
        "GET",
        "/api/v1/query_range?query=rate(http_requests_total%5B5m%5D)&start=0&end=120&step=60",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["resultType"], "matrix");
    assert_eq!(json["series"][0]["samples"].as_array().unwrap().len(), 3);
    assert!(app
        .cache
        .has("query:range:0:120:60:rate(http_requests_total[5m])"));
}

#[tokio::test]
async fn test_query_range_rejects_bad_ranges() {
    let app = create_test_app();

    for uri in [
        "/api/v1/query_range?query=up&start=120&end=0&step=60",
        "/api/v1/query_range?query=up&start=0&end=120&step=0",
        "/api/v1/query_range?query=up&start=0&end=120&step=-5",
        "/api/v1/query_range?query=up&start=0&end=120",
    ] {
        let response = send(&app, "GET", uri).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    assert_eq!(app.backend.calls(), 0);
}

// == Summary and Alerts Endpoint Tests ==

#[tokio::test]
async fn test_metric_summary() {
    let app = create_test_app();

    let response = send(&app, "GET", "/api/v1/summary/node_load1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["metric"], "node_load1");
    assert_eq!(json["min"], 1.0);
    assert_eq!(json["max"], 3.0);
    assert_eq!(json["avg"], 2.0);
    assert_eq!(json["current"], 2.0);

    send(&app, "GET", "/api/v1/summary/node_load1").await;
    assert_eq!(app.backend.calls(), 1);
}

#[tokio::test]
async fn test_metric_summary_rejects_expressions() {
    let app = create_test_app();

    let response = send(&app, "GET", "/api/v1/summary/sum(up)").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.backend.calls(), 0);
}

#[tokio::test]
async fn test_alerts() {
    let app = create_test_app();

    let response = send(&app, "GET", "/api/v1/alerts").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["firing"], 1);
    assert_eq!(json["by_severity"]["critical"], 1);
    assert_eq!(json["alerts"][0]["name"], "HighLatency");
}

// == Cache Administration Endpoint Tests ==

#[tokio::test]
async fn test_cache_stats() {
    let app = create_test_app_with(
        CacheConfig::default()
            .with_max_items(2)
            .with_policy(EvictionPolicy::Oldest),
    );

    for time in 1..=3 {
        send(&app, "GET", &format!("/api/v1/query?query=up&time={}", time)).await;
    }

    let response = send(&app, "GET", "/api/v1/cache/stats").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["misses"], 3);
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["total_entries"], 2);
    assert_eq!(json["max_items"], 2);
    assert_eq!(json["policy"], "OLDEST");
    assert_eq!(json["enabled"], true);
}

#[tokio::test]
async fn test_cache_keys() {
    let app = create_test_app();
    send(&app, "GET", "/api/v1/alerts").await;
    send(&app, "GET", "/api/v1/query?query=up").await;

    let json = body_to_json(send(&app, "GET", "/api/v1/cache/keys").await).await;
    assert_eq!(json["count"], 2);
    assert_eq!(json["keys"][0], "alerts:summary");
    assert_eq!(json["keys"][1], "query:instant:now:up");
}

#[tokio::test]
async fn test_cache_entry_lookup_and_delete() {
    let app = create_test_app();
    send(&app, "GET", "/api/v1/alerts").await;

    let response = send(&app, "GET", "/api/v1/cache/entry/alerts:summary").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["kind"], "alerts");
    assert_eq!(json["value"]["data"]["firing"], 1);

    let response = send(&app, "DELETE", "/api/v1/cache/entry/alerts:summary").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!app.cache.has("alerts:summary"));

    let response = send(&app, "DELETE", "/api/v1/cache/entry/alerts:summary").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "GET", "/api/v1/cache/entry/alerts:summary").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cache_flush() {
    let app = create_test_app();
    send(&app, "GET", "/api/v1/alerts").await;
    send(&app, "GET", "/api/v1/summary/up").await;

    let response = send(&app, "DELETE", "/api/v1/cache").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["removed"], 2);
    assert!(app.cache.is_empty());

    // Next request goes back upstream
    send(&app, "GET", "/api/v1/alerts").await;
    assert_eq!(app.backend.calls(), 3);
}

#[tokio::test]
async fn test_lfu_cache_still_serves_when_full() {
    let app = create_test_app_with(
        CacheConfig::default()
            .with_max_items(1)
            .with_policy(EvictionPolicy::Lfu),
    );

    let first = send(&app, "GET", "/api/v1/query?query=a").await;
    let second = send(&app, "GET", "/api/v1/query?query=b").await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(app.cache.count(), 1);

    // New keys are refused, overwrites of held keys are not
    let cached = app.cache.get("query:instant:now:a").unwrap();
    assert_err!(app.cache.set("extra", cached.clone()));
    assert_ok!(app.cache.set("query:instant:now:a", cached));
}

#[tokio::test]
async fn test_entries_expire_through_background_sweep() {
    let app = create_test_app_with(CacheConfig::new(
        Duration::from_millis(50),
        Duration::from_millis(20),
    ));
    assert!(app.cache.start_cleanup());

    assert_eq!(
        send(&app, "GET", "/api/v1/query?query=up").await.status(),
        StatusCode::OK
    );
    assert_eq!(app.cache.count(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(app.cache.count(), 0);
    let stats = app.cache.stats();
    assert!(stats.cleanup_runs >= 1);
    assert_eq!(stats.expired_deletions, 1);

    app.cache.stop();
    assert!(!app.cache.is_sweeping());
}

// == Health Endpoint Tests ==

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let response = send(&app, "GET", "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

#[tokio::test]
async fn test_unknown_route() {
    let app = create_test_app();

    let response = send(&app, "GET", "/set").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
