//! Closed value model for instruments.

use crate::error::Result;

/// Instrument kind, as exported in the document `Type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    Summary,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "Counter",
            MetricKind::Gauge => "Gauge",
            MetricKind::Summary => "Summary",
        }
    }
}

/// One quantile estimate of a summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantile {
    pub quantile: f64,
    pub value: f64,
}

/// Point-in-time value of one instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    Counter { value: f64 },
    Gauge { value: f64 },
    Summary { sum: f64, count: u64, quantiles: Vec<Quantile> },
}

impl MetricValue {
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricValue::Counter { .. } => MetricKind::Counter,
            MetricValue::Gauge { .. } => MetricKind::Gauge,
            MetricValue::Summary { .. } => MetricKind::Summary,
        }
    }
}

/// Anything the export pipeline can read a value from.
///
/// Implementations synchronize their own state; the instrument map only ever
/// hands out shared references.
pub trait Metric: Send + Sync {
    fn snapshot(&self) -> Result<MetricValue>;
}
