use std::time::Duration;

use serde::Deserialize;
use espush_core::error::{EsPushError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EsPushConfig {
    pub version: u32,

    pub exporter: ExporterSection,

    #[serde(default)]
    pub log: LogSection,
}

impl EsPushConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(EsPushError::Config(format!(
                "unsupported config version {}",
                self.version
            )));
        }
        self.exporter.validate()?;
        self.log.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterSection {
    /// Destination prefix; each document gets a unique suffix appended.
    pub base_url: String,

    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_push_timeout_ms")]
    pub push_timeout_ms: u64,

    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl ExporterSection {
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(EsPushError::Config(
                "exporter.base_url must start with http:// or https://".into(),
            ));
        }
        if !(1000..=3_600_000).contains(&self.interval_ms) {
            return Err(EsPushError::Config(
                "exporter.interval_ms must be between 1000 and 3600000".into(),
            ));
        }
        if !(100..=60_000).contains(&self.push_timeout_ms) {
            return Err(EsPushError::Config(
                "exporter.push_timeout_ms must be between 100 and 60000".into(),
            ));
        }
        if self.push_timeout_ms >= self.interval_ms {
            return Err(EsPushError::Config(
                "exporter.push_timeout_ms must be less than interval_ms".into(),
            ));
        }
        if !(1..=256).contains(&self.max_in_flight) {
            return Err(EsPushError::Config(
                "exporter.max_in_flight must be between 1 and 256".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_millis(self.push_timeout_ms)
    }
}

fn default_interval_ms() -> u64 {
    10_000
}
fn default_push_timeout_ms() -> u64 {
    5_000
}
fn default_max_in_flight() -> usize {
    8
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogSection {
    pub fn validate(&self) -> Result<()> {
        match self.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(EsPushError::Config(format!("log.level {other:?} is not a valid level"))),
        }
    }
}

fn default_log_level() -> String {
    "info".into()
}
