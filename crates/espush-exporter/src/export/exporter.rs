use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::Utc;
use futures_util::stream::{self, StreamExt};
use tokio::sync::Mutex;
use tokio::time::{timeout, MissedTickBehavior};

use espush_core::error::{EsPushError, Result};
use espush_core::metric::MetricValue;

use super::cache::LastValueCache;
use super::document;
use crate::obs::ExporterMetrics;
use crate::registry::Registry;
use crate::sink::DocumentSink;

/// Outcome counts of one export cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExportReport {
    /// Documents the sink accepted.
    pub exported: usize,
    /// Instruments whose value could not be read.
    pub skipped: usize,
    /// Documents that failed to serialize, push, or finish in time.
    pub failed: usize,
}

/// Pushes one document per live instrument to a sink.
///
/// The exporter owns the counter last-value cache. Cycles are serialized:
/// the cache lock is held from gather to the last push.
pub struct Exporter {
    base_url: String,
    sink: Arc<dyn DocumentSink>,
    max_in_flight: usize,
    last_values: Mutex<LastValueCache>,
    seq: AtomicU64,
    metrics: Option<ExporterMetrics>,
}

impl Exporter {
    pub fn new(base_url: impl Into<String>, sink: Arc<dyn DocumentSink>, max_in_flight: usize) -> Self {
        Self {
            base_url: base_url.into(),
            sink,
            max_in_flight: max_in_flight.max(1),
            last_values: Mutex::new(LastValueCache::new()),
            seq: AtomicU64::new(0),
            metrics: None,
        }
    }

    /// Record every cycle's report into `metrics`.
    pub fn with_metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run one export cycle. Per-instrument and per-document failures are
    /// logged and counted; the cycle always visits every instrument.
    pub async fn export(&self, registry: &Registry) -> ExportReport {
        let started = Instant::now();
        let mut last_values = self.last_values.lock().await;
        let timestamp = document::format_timestamp(Utc::now());
        let mut report = ExportReport::default();
        let mut outgoing = Vec::new();

        for family in registry.gather() {
            let fq_name = family.desc.fq_name();
            for collected in &family.metrics {
                let value = match collected.metric.snapshot() {
                    Ok(MetricValue::Counter { value }) => MetricValue::Counter {
                        value: last_values.delta(fq_name, collected.hash, &collected.label_values, value),
                    },
                    Ok(value) => value,
                    Err(e) => {
                        tracing::warn!(fq_name = %fq_name, labels = ?collected.label_values, error = %e, "instrument skipped");
                        report.skipped += 1;
                        continue;
                    }
                };

                let doc = document::build(&family.desc, &collected.label_values, &value, &timestamp);
                match serde_json::to_vec(&doc) {
                    Ok(body) => outgoing.push((self.next_destination(), Bytes::from(body))),
                    Err(e) => {
                        let e = EsPushError::Serialization(e.to_string());
                        tracing::warn!(fq_name = %fq_name, error = %e, "document dropped");
                        report.failed += 1;
                    }
                }
            }
        }

        let limit = self.sink.timeout();
        let sink = self.sink.as_ref();
        let results: Vec<Result<()>> = stream::iter(outgoing)
            .map(|(destination, body)| push_one(sink, destination, body, limit))
            .buffer_unordered(self.max_in_flight)
            .collect()
            .await;

        for result in results {
            match result {
                Ok(()) => report.exported += 1,
                Err(e) => {
                    tracing::warn!(error = %e, kind = e.kind().as_str(), "document push failed");
                    report.failed += 1;
                }
            }
        }
        drop(last_values);

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record(&report, elapsed);
        }
        tracing::debug!(
            exported = report.exported,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = elapsed.as_millis() as u64,
            "export cycle finished"
        );
        report
    }

    /// Export every `interval` until `shutdown` resolves. The first cycle
    /// runs immediately; an in-progress cycle finishes before stopping.
    pub async fn run<F>(&self, registry: &Registry, interval: Duration, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("export loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.export(registry).await;
                    if report.failed > 0 || report.skipped > 0 {
                        tracing::info!(
                            exported = report.exported,
                            skipped = report.skipped,
                            failed = report.failed,
                            "export cycle incomplete"
                        );
                    }
                }
            }
        }
    }

    /// Base URL plus a suffix unique within this exporter.
    fn next_destination(&self) -> String {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        format!("{}{nanos}-{seq}", self.base_url)
    }
}

async fn push_one(sink: &dyn DocumentSink, destination: String, body: Bytes, limit: Duration) -> Result<()> {
    let outcome = timeout(limit, sink.push(&destination, body)).await;
    match outcome {
        Ok(result) => result,
        Err(_) => Err(EsPushError::Timeout {
            destination,
            timeout_ms: limit.as_millis() as u64,
        }),
    }
}
