//! Request DTOs for the proxy API
//!
//! Query-string parameters accepted by the query endpoints, and the cache
//! keys derived from them.

use serde::Deserialize;

/// Upper bound on points per series, matching the Prometheus limit
pub const MAX_RANGE_POINTS: f64 = 11_000.0;

/// Parameters for an instant query (GET /api/v1/query)
///
/// # Fields
/// - `query`: PromQL expression
/// - `time`: Optional evaluation time in Unix seconds (backend "now" if absent)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstantQuery {
    pub query: String,
    #[serde(default)]
    pub time: Option<f64>,
}

impl InstantQuery {
    pub fn new(query: impl Into<String>, time: Option<f64>) -> Self {
        Self {
            query: query.into(),
            time,
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            return Some("Query cannot be empty".to_string());
        }
        if let Some(time) = self.time {
            if !time.is_finite() {
                return Some("Time must be a finite Unix timestamp".to_string());
            }
        }
        None
    }

    /// Deterministic cache key. The query goes last so that `:` inside the
    /// expression cannot collide with the fixed fields.
    pub fn cache_key(&self) -> String {
        match self.time {
            Some(time) => format!("query:instant:{}:{}", time, self.query),
            None => format!("query:instant:now:{}", self.query),
        }
    }
}

/// Parameters for a range query (GET /api/v1/query_range)
///
/// `start`, `end` are Unix seconds and `step` is the resolution in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RangeQuery {
    pub query: String,
    pub start: f64,
    pub end: f64,
    pub step: f64,
}

impl RangeQuery {
    pub fn new(query: impl Into<String>, start: f64, end: f64, step: f64) -> Self {
        Self {
            query: query.into(),
            start,
            end,
            step,
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            return Some("Query cannot be empty".to_string());
        }
        if !(self.start.is_finite() && self.end.is_finite() && self.step.is_finite()) {
            return Some("start, end and step must be finite numbers".to_string());
        }
        if self.step <= 0.0 {
            return Some("Step must be positive".to_string());
        }
        if self.start > self.end {
            return Some("Start must not be after end".to_string());
        }
        if (self.end - self.start) / self.step > MAX_RANGE_POINTS {
            return Some(format!(
                "Range exceeds {} points per series; increase step",
                MAX_RANGE_POINTS
            ));
        }
        None
    }

    /// Deterministic cache key covering query, time range and step.
    pub fn cache_key(&self) -> String {
        format!(
            "query:range:{}:{}:{}:{}",
            self.start, self.end, self.step, self.query
        )
    }
}

/// Checks a Prometheus metric name: `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
