//! espush exporter
//!
//! Periodically pushes one JSON document per live instrument to a document
//! store over HTTP. Usage: `espush-exporter [config.yaml]` (default
//! `espush.yaml`). Stops on Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use espush_core::error::Result;
use espush_exporter::config::{self, EsPushConfig};
use espush_exporter::export::Exporter;
use espush_exporter::obs::ExporterMetrics;
use espush_exporter::registry::Registry;
use espush_exporter::sink::HttpSink;
use espush_exporter::telemetry;

#[tokio::main]
async fn main() -> ExitCode {
    let path = std::env::args().nth(1).unwrap_or_else(|| "espush.yaml".to_string());

    let cfg = match config::load_from_file(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("espush-exporter: {e}");
            return ExitCode::FAILURE;
        }
    };
    telemetry::init(&cfg.log.level);

    match run(cfg).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "espush-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: EsPushConfig) -> Result<()> {
    let registry = Registry::new();
    let metrics = ExporterMetrics::new()?;
    metrics.register(&registry)?;

    let sink = Arc::new(HttpSink::new(cfg.exporter.push_timeout())?);
    let exporter = Exporter::new(cfg.exporter.base_url.clone(), sink, cfg.exporter.max_in_flight)
        .with_metrics(metrics);

    tracing::info!(
        base_url = %cfg.exporter.base_url,
        interval_ms = cfg.exporter.interval_ms,
        "espush-exporter starting"
    );

    exporter
        .run(&registry, cfg.exporter.interval(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "ctrl-c handler failed; stopping");
            }
        })
        .await;
    Ok(())
}
