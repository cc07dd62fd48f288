//! Prometheus HTTP API client

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::UpstreamError;
use crate::models::{InstantQuery, QueryResult, RangeQuery};
use crate::upstream::wire::ApiResponse;
use crate::upstream::QueryClient;

/// Client for a Prometheus-compatible `/api/v1` endpoint.
///
/// Every request is bounded by the timeout given at construction; that
/// timeout is unrelated to cache TTLs.
#[derive(Debug, Clone)]
pub struct PrometheusClient {
    base_url: String,
    http: reqwest::Client,
}

impl PrometheusClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn fetch(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<QueryResult, UpstreamError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, ?params, "Querying upstream");

        let response = self.http.get(&url).query(params).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let result = match serde_json::from_slice::<ApiResponse>(&body) {
            Ok(envelope) => envelope.into_result(status)?,
            Err(_) if !status.is_success() => {
                return Err(UpstreamError::Status(status.as_u16()))
            }
            Err(e) => return Err(UpstreamError::Decode(e.to_string())),
        };

        debug!(
            %url,
            series = result.series.len(),
            samples = result.sample_count(),
            "Upstream answered"
        );
        Ok(result)
    }
}

#[async_trait]
impl QueryClient for PrometheusClient {
    async fn instant_query(&self, query: &InstantQuery) -> Result<QueryResult, UpstreamError> {
        let mut params = vec![("query", query.query.clone())];
        if let Some(time) = query.time {
            params.push(("time", time.to_string()));
        }
        self.fetch("/api/v1/query", &params).await
    }

    async fn range_query(&self, query: &RangeQuery) -> Result<QueryResult, UpstreamError> {
        let params = [
            ("query", query.query.clone()),
            ("start", query.start.to_string()),
            ("end", query.end.to_string()),
            ("step", query.step.to_string()),
        ];
        self.fetch("/api/v1/query_range", &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResultType;
    use axum::{
        extract::Query,
        http::StatusCode,
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves `app` on an ephemeral port and returns its base URL.
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn echo_query(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        // Echo the received parameters back as labels
        Json(json!({
            "status": "success",
            "data": {
                "resultType": "vector",
                "result": [{ "metric": params, "value": [1700000000, "1"] }]
            }
        }))
    }

    async fn echo_range(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
        Json(json!({
            "status": "success",
            "data": {
                "resultType": "matrix",
                "result": [{ "metric": params, "values": [[10, "1"], [20, "2"]] }]
            }
        }))
    }

    fn client(base_url: &str) -> PrometheusClient {
        PrometheusClient::new(base_url, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_instant_query_forwards_parameters() {
        let base = serve(Router::new().route("/api/v1/query", get(echo_query))).await;

        let result = client(&base)
            .instant_query(&InstantQuery::new("up{job=\"api\"}", Some(1700000000.5)))
            .await
            .unwrap();

        assert_eq!(result.result_type, ResultType::Vector);
        let labels = &result.series[0].metric;
        assert_eq!(labels["query"], "up{job=\"api\"}");
        assert_eq!(labels["time"], "1700000000.5");
    }

    #[tokio::test]
    async fn test_instant_query_without_time() {
        let base = serve(Router::new().route("/api/v1/query", get(echo_query))).await;

        let result = client(&base)
            .instant_query(&InstantQuery::new("up", None))
            .await
            .unwrap();

        assert!(!result.series[0].metric.contains_key("time"));
    }

    #[tokio::test]
    async fn test_range_query_forwards_parameters() {
        let base = serve(Router::new().route("/api/v1/query_range", get(echo_range))).await;

        let result = client(&format!("{}/", base))
            .range_query(&RangeQuery::new("rate(x[5m])", 0.0, 60.0, 15.0))
            .await
            .unwrap();

        assert_eq!(result.result_type, ResultType::Matrix);
        assert_eq!(result.sample_count(), 2);
        let labels = &result.series[0].metric;
        assert_eq!(labels["start"], "0");
        assert_eq!(labels["end"], "60");
        assert_eq!(labels["step"], "15");
    }

    #[tokio::test]
    async fn test_query_error_body() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "status": "error",
                        "errorType": "bad_data",
                        "error": "parse error"
                    })),
                )
            }),
        );
        let base = serve(app).await;

        let err = client(&base)
            .instant_query(&InstantQuery::new("up{", None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            UpstreamError::Query { ref error_type, .. } if error_type == "bad_data"
        ));
    }

    #[tokio::test]
    async fn test_http_failure_without_body() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR.into_response() }),
        );
        let base = serve(app).await;

        let err = client(&base)
            .instant_query(&InstantQuery::new("up", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Status(500)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let app = Router::new().route(
            "/api/v1/query",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                StatusCode::OK
            }),
        );
        let base = serve(app).await;
        let client = PrometheusClient::new(base, Duration::from_millis(100)).unwrap();

        let err = client
            .instant_query(&InstantQuery::new("up", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Timeout));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(&format!("http://{}", addr))
            .instant_query(&InstantQuery::new("up", None))
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Transport(_)));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = client("http://prometheus:9090/");
        assert_eq!(client.base_url(), "http://prometheus:9090");
    }
}
