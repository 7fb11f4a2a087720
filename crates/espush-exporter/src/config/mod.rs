//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;

use espush_core::error::{EsPushError, Result};

pub use schema::{EsPushConfig, ExporterSection, LogSection};

pub fn load_from_file(path: &str) -> Result<EsPushConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| EsPushError::Config(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<EsPushConfig> {
    let cfg: EsPushConfig =
        serde_yaml::from_str(s).map_err(|e| EsPushError::Config(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
