//! Export pipeline behavior against in-memory sinks.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use espush_core::error::{EsPushError, Result};
use espush_core::{CounterVec, Desc, GaugeVec, Metric, MetricValue, MetricVec, SummaryOpts, SummaryVec};
use espush_exporter::export::Exporter;
use espush_exporter::obs::ExporterMetrics;
use espush_exporter::registry::Registry;
use espush_exporter::sink::DocumentSink;

const BASE: &str = "http://sink.test/metrics/_doc/";

/// Records every pushed document; fails the pushes whose ordinal is in `fail_on`.
#[derive(Default)]
struct RecordingSink {
    docs: Mutex<Vec<(String, Value)>>,
    calls: AtomicUsize,
    fail_on: Vec<usize>,
}

impl RecordingSink {
    fn failing_on(fail_on: Vec<usize>) -> Self {
        Self {
            fail_on,
            ..Self::default()
        }
    }

    fn take(&self) -> Vec<(String, Value)> {
        std::mem::take(&mut *self.docs.lock().unwrap())
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn push(&self, destination: &str, document: Bytes) -> Result<()> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.contains(&n) {
            return Err(EsPushError::Sink {
                destination: destination.to_owned(),
                reason: "injected failure".into(),
            });
        }
        let doc: Value = serde_json::from_slice(&document).unwrap();
        self.docs.lock().unwrap().push((destination.to_owned(), doc));
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }
}

/// Never answers within its own timeout.
struct StallingSink;

#[async_trait]
impl DocumentSink for StallingSink {
    async fn push(&self, _destination: &str, _document: Bytes) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(20)
    }
}

struct BrokenMetric;

impl Metric for BrokenMetric {
    fn snapshot(&self) -> Result<MetricValue> {
        Err(EsPushError::Snapshot("instrument unreadable".into()))
    }
}

fn counter_vec(registry: &Registry) -> CounterVec {
    let vec = CounterVec::from_desc(Desc::new("requests_total", "Handled requests.", ["route"]).unwrap());
    registry.register(Arc::new(vec.clone())).unwrap();
    vec
}

fn docs_named<'a>(docs: &'a [(String, Value)], fq_name: &str) -> Vec<&'a Value> {
    docs.iter().map(|(_, d)| d).filter(|d| d["FqName"] == fq_name).collect()
}

#[tokio::test]
async fn counter_exports_per_cycle_delta() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4);

    let counter = requests.get_metric_with_label_values(&["/home"]).unwrap();
    counter.inc_by(10.0);
    let report = exporter.export(&registry).await;
    assert_eq!(report.exported, 1);

    let first = sink.take();
    assert_eq!(first[0].1["Value"], 10.0);
    assert_eq!(first[0].1["Type"], "Counter");
    assert_eq!(first[0].1["route"], "/home");
    assert_eq!(first[0].1["Help"], "Handled requests.");
    assert!(first[0].1["Timestamp"].as_str().unwrap().ends_with('Z'));

    counter.inc_by(5.0);
    exporter.export(&registry).await;
    let second = sink.take();
    assert_eq!(second[0].1["Value"], 5.0);
}

#[tokio::test]
async fn gauges_and_summaries_export_current_state() {
    let registry = Registry::new();
    let gauges = GaugeVec::from_desc(Desc::new("queue_depth", "Items waiting.", ["queue"]).unwrap());
    let latency = SummaryVec::with_opts(
        Desc::new("latency_seconds", "Request latency.", ["route"]).unwrap(),
        SummaryOpts {
            objectives: vec![0.5, 0.75],
            max_samples: 100,
        },
    )
    .unwrap();
    registry.register(Arc::new(gauges.clone())).unwrap();
    registry.register(Arc::new(latency.clone())).unwrap();

    gauges.get_metric_with_label_values(&["ingest"]).unwrap().set(7.0);
    let s = latency.get_metric_with_label_values(&["/home"]).unwrap();
    for v in [1.0, 2.0, 3.0, 4.0] {
        s.observe(v);
    }

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4);
    // Gauges are not delta-encoded: two cycles report the same value.
    exporter.export(&registry).await;
    exporter.export(&registry).await;
    let docs = sink.take();

    let gauge_docs = docs_named(&docs, "queue_depth");
    assert_eq!(gauge_docs.len(), 2);
    assert!(gauge_docs.iter().all(|d| d["Value"] == 7.0 && d["Type"] == "Gauge"));

    let summary = docs_named(&docs, "latency_seconds")[0];
    assert_eq!(summary["Type"], "Summary");
    assert_eq!(summary["Sum"], 10.0);
    assert_eq!(summary["Count"], 4);
    assert_eq!(summary["QUANTILE_50"], 2.0);
    assert_eq!(summary["QUANTILE_75"], 3.0);
    assert!(summary.get("QUANTILE_99").is_none());
    assert!(summary.get("Value").is_none());
}

#[tokio::test]
async fn push_failures_do_not_abort_the_cycle() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    for route in ["/a", "/b", "/c"] {
        requests.get_metric_with_label_values(&[route]).unwrap().inc();
    }

    let sink = Arc::new(RecordingSink::failing_on(vec![0]));
    let exporter = Exporter::new(BASE, sink.clone(), 1);
    let report = exporter.export(&registry).await;

    assert_eq!(report.exported, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(sink.take().len(), 2);
}

#[tokio::test]
async fn timed_out_pushes_count_as_failures() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    requests.get_metric_with_label_values(&["/a"]).unwrap().inc();
    requests.get_metric_with_label_values(&["/b"]).unwrap().inc();

    let exporter = Exporter::new(BASE, Arc::new(StallingSink), 2);
    let report = tokio::time::timeout(Duration::from_secs(5), exporter.export(&registry))
        .await
        .expect("cycle must finish despite stalled sink");
    assert_eq!(report.exported, 0);
    assert_eq!(report.failed, 2);
}

#[tokio::test]
async fn unreadable_instrument_is_skipped_alone() {
    let registry = Registry::new();
    let broken = MetricVec::new(
        Desc::new("broken_metric", "Always fails.", Vec::<String>::new()).unwrap(),
        |_: &[String]| BrokenMetric,
    );
    broken.get_metric_with_label_values(&[]).unwrap();
    registry.register(Arc::new(broken)).unwrap();
    let requests = counter_vec(&registry);
    requests.get_metric_with_label_values(&["/ok"]).unwrap().inc();

    let sink = Arc::new(RecordingSink::default());
    let report = Exporter::new(BASE, sink.clone(), 4).export(&registry).await;
    assert_eq!(report.skipped, 1);
    assert_eq!(report.exported, 1);
    assert_eq!(sink.take()[0].1["FqName"], "requests_total");
}

#[tokio::test]
async fn destinations_are_unique_per_document() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    for i in 0..20 {
        let route = format!("/r{i}");
        requests.get_metric_with_label_values(&[route.as_str()]).unwrap().inc();
    }

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 8);
    exporter.export(&registry).await;
    exporter.export(&registry).await;

    let mut destinations: Vec<String> = sink.take().into_iter().map(|(d, _)| d).collect();
    assert_eq!(destinations.len(), 40);
    assert!(destinations.iter().all(|d| d.starts_with(BASE) && d.len() > BASE.len()));
    destinations.sort();
    destinations.dedup();
    assert_eq!(destinations.len(), 40);
}

#[tokio::test]
async fn concurrent_cycles_do_not_double_count() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    requests.get_metric_with_label_values(&["/a"]).unwrap().inc_by(10.0);

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4);
    let (a, b) = tokio::join!(exporter.export(&registry), exporter.export(&registry));
    assert_eq!(a.exported + b.exported, 2);

    let mut values: Vec<f64> = sink.take().iter().map(|(_, d)| d["Value"].as_f64().unwrap()).collect();
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![0.0, 10.0]);
}

#[tokio::test]
async fn deleted_counter_keeps_stale_baseline() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    requests.get_metric_with_label_values(&["/a"]).unwrap().inc_by(15.0);

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4);
    exporter.export(&registry).await;
    sink.take();

    assert!(requests.delete_label_values(&["/a"]));
    exporter.export(&registry).await;
    assert!(sink.take().is_empty());

    requests.get_metric_with_label_values(&["/a"]).unwrap().inc_by(3.0);
    exporter.export(&registry).await;
    assert_eq!(sink.take()[0].1["Value"], -12.0);
}

#[tokio::test]
async fn exporter_reports_its_own_cycles() {
    let registry = Registry::new();
    let metrics = ExporterMetrics::new().unwrap();
    metrics.register(&registry).unwrap();

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4).with_metrics(metrics);
    // Instruments appear once the first cycle records into them.
    exporter.export(&registry).await;
    assert!(sink.take().is_empty());

    exporter.export(&registry).await;
    exporter.export(&registry).await;
    let docs = sink.take();

    let cycles = docs_named(&docs, "espush_export_cycles_total");
    assert_eq!(cycles.len(), 2);
    assert!(cycles.iter().all(|d| d["Value"] == 1.0));

    let exported: Vec<&Value> = docs_named(&docs, "espush_documents_total")
        .into_iter()
        .filter(|d| d["outcome"] == "exported")
        .collect();
    assert_eq!(exported.len(), 2);
    // Cycle two reports the zero recorded by cycle one; cycle three sees cycle two's five documents.
    let mut values: Vec<f64> = exported.iter().map(|d| d["Value"].as_f64().unwrap()).collect();
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![0.0, 5.0]);
}

#[tokio::test]
async fn run_loop_exports_until_shutdown() {
    let registry = Registry::new();
    let requests = counter_vec(&registry);
    requests.get_metric_with_label_values(&["/a"]).unwrap().inc();

    let sink = Arc::new(RecordingSink::default());
    let exporter = Exporter::new(BASE, sink.clone(), 4);
    let shutdown = tokio::time::sleep(Duration::from_millis(100));

    tokio::time::timeout(
        Duration::from_secs(5),
        exporter.run(&registry, Duration::from_secs(60), shutdown),
    )
    .await
    .expect("run must stop on shutdown");

    // The first tick fires immediately; the next is a minute away.
    assert_eq!(sink.take().len(), 1);
}
