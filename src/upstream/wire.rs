//! Prometheus HTTP API payloads
//!
//! Raw response envelope as returned by `/api/v1/query` and
//! `/api/v1/query_range`.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::UpstreamError;
use crate::models::QueryResult;

/// `[<unix seconds>, "<value>"]`
pub type RawSample = (f64, String);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: String,
    #[serde(default)]
    pub data: Option<QueryData>,
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "resultType", content = "result", rename_all = "lowercase")]
pub enum QueryData {
    Vector(Vec<VectorItem>),
    Matrix(Vec<MatrixItem>),
    Scalar(RawSample),
    String(RawSample),
}

#[derive(Debug, Deserialize)]
pub struct VectorItem {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub value: RawSample,
}

#[derive(Debug, Deserialize)]
pub struct MatrixItem {
    #[serde(default)]
    pub metric: BTreeMap<String, String>,
    pub values: Vec<RawSample>,
}

impl ApiResponse {
    /// Interprets the envelope together with the HTTP status it came with.
    pub fn into_result(self, status: StatusCode) -> Result<QueryResult, UpstreamError> {
        match (self.status.as_str(), self.data) {
            ("success", Some(data)) if status.is_success() => QueryResult::try_from(data),
            ("error", _) => Err(UpstreamError::Query {
                error_type: self.error_type.unwrap_or_else(|| "unknown".to_string()),
                message: self.error.unwrap_or_default(),
            }),
            _ if !status.is_success() => Err(UpstreamError::Status(status.as_u16())),
            _ => Err(UpstreamError::Decode(format!(
                "unexpected response status '{}'",
                self.status
            ))),
        }
    }
}
