use std::sync::Arc;
use std::time::Duration;

use espush_core::desc::{build_fq_name, Desc};
use espush_core::error::Result;
use espush_core::{CounterVec, SummaryOpts, SummaryVec};

use crate::export::ExportReport;
use crate::registry::Registry;

const NAMESPACE: &str = "espush";

pub struct ExporterMetrics {
    pub cycles: CounterVec,
    pub documents: CounterVec, // label: outcome
    pub duration: SummaryVec,  // In Seconds
}

impl ExporterMetrics {
    pub fn new() -> Result<Self> {
        let no_labels: [&str; 0] = [];
        Ok(Self {
            cycles: CounterVec::from_desc(Desc::new(
                build_fq_name(NAMESPACE, "export", "cycles_total"),
                "Completed export cycles.",
                no_labels,
            )?),
            documents: CounterVec::from_desc(Desc::new(
                build_fq_name(NAMESPACE, "", "documents_total"),
                "Documents handled by export cycles, by outcome.",
                ["outcome"],
            )?),
            duration: SummaryVec::with_opts(
                Desc::new(
                    build_fq_name(NAMESPACE, "export", "duration_seconds"),
                    "Wall time of export cycles.",
                    no_labels,
                )?,
                SummaryOpts::default(),
            )?,
        })
    }

    /// Register all families in `registry`.
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Arc::new(self.cycles.clone()))?;
        registry.register(Arc::new(self.documents.clone()))?;
        registry.register(Arc::new(self.duration.clone()))?;
        Ok(())
    }

    pub fn record(&self, report: &ExportReport, elapsed: Duration) {
        if let Ok(cycles) = self.cycles.get_metric_with_label_values(&[]) {
            cycles.inc();
        }
        for (outcome, n) in [
            ("exported", report.exported),
            ("skipped", report.skipped),
            ("failed", report.failed),
        ] {
            match self.documents.get_metric_with_label_values(&[outcome]) {
                Ok(counter) => counter.inc_by(n as f64),
                Err(e) => tracing::debug!(error = %e, "documents counter unavailable"),
            }
        }
        if let Ok(duration) = self.duration.get_metric_with_label_values(&[]) {
            duration.observe(elapsed.as_secs_f64());
        }
    }
}
