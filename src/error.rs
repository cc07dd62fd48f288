//! Error types for the metrics proxy
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::cache::EvictionPolicy;

// == Cache Error Enum ==
/// Errors raised by the cache itself.
///
/// Lookups never fail: absent or expired keys are reported as `None`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The configured eviction policy cannot select a victim
    #[error("eviction policy {0} is not implemented")]
    UnsupportedPolicy(EvictionPolicy),
}

// == Upstream Error Enum ==
/// Errors returned by the upstream query client.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request did not complete within the client timeout
    #[error("upstream request timed out")]
    Timeout,

    /// Connection or protocol failure
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// Non-success HTTP status without a parseable error body
    #[error("upstream returned HTTP {0}")]
    Status(u16),

    /// Backend answered with `status: error`
    #[error("query failed ({error_type}): {message}")]
    Query { error_type: String, message: String },

    /// Response body did not match the expected shape
    #[error("malformed upstream response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            UpstreamError::Status(status.as_u16())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

// == API Error Enum ==
/// Error type returned by HTTP handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Upstream metrics backend failed
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            // Details are logged by the service layer; clients get a generic message
            ApiError::Upstream(_) => (
                StatusCode::BAD_GATEWAY,
                "Failed to query metrics backend".to_string(),
            ),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
