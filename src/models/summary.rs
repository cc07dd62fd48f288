//! Dashboard summary models
//!
//! Aggregates built from query results and the tagged value type stored in
//! the response cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::models::QueryResult;

// == Alerts ==
/// One active alert taken from the `ALERTS` series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertInfo {
    pub name: String,
    /// `firing` or `pending`
    pub state: String,
    pub severity: String,
    /// Remaining labels, without `__name__`, `alertname`, `alertstate` and `severity`
    pub labels: BTreeMap<String, String>,
}

/// Counts of active alerts for the dashboard alert card.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: usize,
    pub firing: usize,
    pub pending: usize,
    pub by_severity: BTreeMap<String, usize>,
    pub alerts: Vec<AlertInfo>,
}

impl AlertSummary {
    /// Builds the summary from an instant query of `ALERTS`.
    ///
    /// Alerts without a `severity` label are counted under `none`. Firing
    /// alerts are listed first, then by name.
    pub fn from_result(result: &QueryResult) -> Self {
        let mut summary = Self::default();

        for series in &result.series {
            let mut labels = series.metric.clone();
            labels.remove("__name__");
            let name = labels.remove("alertname").unwrap_or_default();
            let state = labels
                .remove("alertstate")
                .unwrap_or_else(|| "firing".to_string());
            let severity = labels
                .remove("severity")
                .unwrap_or_else(|| "none".to_string());

            match state.as_str() {
                "firing" => summary.firing += 1,
                "pending" => summary.pending += 1,
                _ => {}
            }
            *summary.by_severity.entry(severity.clone()).or_insert(0) += 1;

            summary.alerts.push(AlertInfo {
                name,
                state,
                severity,
                labels,
            });
        }

        summary.total = summary.alerts.len();
        summary
            .alerts
            .sort_by(|a, b| (a.state != "firing", &a.name).cmp(&(b.state != "firing", &b.name)));
        summary
    }
}

// == Metrics ==
/// Aggregate view of one metric over the summary window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    pub metric: String,
    /// Number of series returned for the metric
    pub series: usize,
    /// Number of finite samples aggregated
    pub samples: usize,
    /// Sum of each series' latest finite value
    pub current: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

impl MetricsSummary {
    /// Aggregates a range query result. Non-finite samples are skipped.
    pub fn from_result(metric: &str, result: &QueryResult) -> Self {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut samples = 0usize;
        let mut current: Option<f64> = None;

        for series in &result.series {
            let finite = series.samples.iter().filter(|s| s.value.is_finite());

            let mut latest: Option<(f64, f64)> = None;
            for sample in finite {
                min = min.min(sample.value);
                max = max.max(sample.value);
                sum += sample.value;
                samples += 1;
                if latest.map_or(true, |(ts, _)| sample.timestamp >= ts) {
                    latest = Some((sample.timestamp, sample.value));
                }
            }

            if let Some((_, value)) = latest {
                *current.get_or_insert(0.0) += value;
            }
        }

        let has_samples = samples > 0;
        Self {
            metric: metric.to_string(),
            series: result.series.len(),
            samples,
            current,
            min: has_samples.then_some(min),
            max: has_samples.then_some(max),
            avg: has_samples.then(|| sum / samples as f64),
        }
    }
}

// == Cached Value ==
/// Everything the service stores in the response cache.
///
/// Payloads sit behind `Arc` so a cached value is never mutated after insert
/// and handing it to a handler is a reference count bump.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedValue {
    Query(Arc<QueryResult>),
    Alerts(Arc<AlertSummary>),
    Summary(Arc<MetricsSummary>),
}

impl CachedValue {
    pub fn kind(&self) -> &'static str {
        match self {
            CachedValue::Query(_) => "query",
            CachedValue::Alerts(_) => "alerts",
            CachedValue::Summary(_) => "summary",
        }
    }

    pub fn as_query(&self) -> Option<Arc<QueryResult>> {
        match self {
            CachedValue::Query(result) => Some(result.clone()),
            _ => None,
        }
    }

    pub fn as_alerts(&self) -> Option<Arc<AlertSummary>> {
        match self {
            CachedValue::Alerts(summary) => Some(summary.clone()),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<Arc<MetricsSummary>> {
        match self {
            CachedValue::Summary(summary) => Some(summary.clone()),
            _ => None,
        }
    }
}
