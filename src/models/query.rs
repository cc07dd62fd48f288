//! Query result models
//!
//! Serializable shapes for Prometheus query results, converted from the raw
//! upstream payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::UpstreamError;
use crate::upstream::wire::{QueryData, RawSample};

/// Kind of result returned by the query engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Vector,
    Matrix,
    Scalar,
    String,
}

/// A single timestamped value. Timestamps are Unix seconds.
///
/// Non-finite values (`NaN`, `±Inf`) are kept as-is and serialize as JSON
/// `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: f64,
    pub value: f64,
}

/// One labelled time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub metric: BTreeMap<String, String>,
    pub samples: Vec<Sample>,
}

impl Series {
    /// Metric name from the `__name__` label, if present.
    pub fn name(&self) -> Option<&str> {
        self.metric.get("__name__").map(String::as_str)
    }

    /// Most recent sample.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples
            .iter()
            .max_by(|a, b| a.timestamp.total_cmp(&b.timestamp))
    }
}

/// Result of an instant or range query.
///
/// Vector results carry one sample per series, matrix results many. Scalar
/// and string results become a single unlabelled series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub result_type: ResultType,
    pub series: Vec<Series>,
}

impl QueryResult {
    pub fn sample_count(&self) -> usize {
        self.series.iter().map(|s| s.samples.len()).sum()
    }
}

impl TryFrom<QueryData> for QueryResult {
    type Error = UpstreamError;

    fn try_from(data: QueryData) -> Result<Self, Self::Error> {
        let (result_type, series) = match data {
            QueryData::Vector(items) => {
                let series = items
                    .into_iter()
                    .map(|item| {
                        Ok(Series {
                            metric: item.metric,
                            samples: vec![parse_sample(item.value)?],
                        })
                    })
                    .collect::<Result<Vec<_>, UpstreamError>>()?;
                (ResultType::Vector, series)
            }
            QueryData::Matrix(items) => {
                let series = items
                    .into_iter()
                    .map(|item| {
                        let samples = item
                            .values
                            .into_iter()
                            .map(parse_sample)
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(Series {
                            metric: item.metric,
                            samples,
                        })
                    })
                    .collect::<Result<Vec<_>, UpstreamError>>()?;
                (ResultType::Matrix, series)
            }
            QueryData::Scalar(raw) => (ResultType::Scalar, vec![unlabelled(parse_sample(raw)?)]),
            QueryData::String(raw) => {
                // String results have no numeric value; keep the timestamp only
                let (timestamp, _) = raw;
                let sample = Sample {
                    timestamp,
                    value: f64::NAN,
                };
                (ResultType::String, vec![unlabelled(sample)])
            }
        };

        Ok(Self {
            result_type,
            series,
        })
    }
}

fn unlabelled(sample: Sample) -> Series {
    Series {
        metric: BTreeMap::new(),
        samples: vec![sample],
    }
}

fn parse_sample((timestamp, raw): RawSample) -> Result<Sample, UpstreamError> {
    Ok(Sample {
        timestamp,
        value: parse_value(&raw)?,
    })
}

/// Parses a Prometheus sample value string.
pub fn parse_value(raw: &str) -> Result<f64, UpstreamError> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        other => other
            .parse()
            .map_err(|_| UpstreamError::Decode(format!("invalid sample value '{other}'"))),
    }
}
