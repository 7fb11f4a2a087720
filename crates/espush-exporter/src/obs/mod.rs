//! Self-instrumentation: the exporter reports its own cycles through the
//! same vectors and pipeline it serves.

pub mod metrics;

pub use metrics::ExporterMetrics;
