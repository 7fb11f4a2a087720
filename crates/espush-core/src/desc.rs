//! Metric family descriptors.

use std::collections::HashSet;

use crate::error::{EsPushError, Result};

/// Document field names every exported document carries. Variable labels
/// become document fields too, so they must not shadow these.
pub const RESERVED_FIELDS: [&str; 7] = ["FqName", "Help", "Type", "Timestamp", "Value", "Sum", "Count"];

/// Prefix of the per-objective summary fields (`QUANTILE_50`, ...).
pub const QUANTILE_FIELD_PREFIX: &str = "QUANTILE_";

/// Field name for one summary objective: 0.5 -> `QUANTILE_50`,
/// 0.999 -> `QUANTILE_99_9`. Percentages are rounded to three decimals.
pub fn quantile_field(quantile: f64) -> String {
    let percent = format!("{:.3}", quantile * 100.0);
    let percent = percent.trim_end_matches('0').trim_end_matches('.');
    format!("{QUANTILE_FIELD_PREFIX}{}", percent.replace('.', "_"))
}

/// Immutable identity of a metric family: name, help text, ordered label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Desc {
    fq_name: String,
    help: String,
    variable_labels: Vec<String>,
}

impl Desc {
    /// Build and validate a descriptor.
    ///
    /// Label order is part of the family's identity: `["job", "instance"]`
    /// and `["instance", "job"]` describe different families.
    pub fn new<I, S>(fq_name: impl Into<String>, help: impl Into<String>, variable_labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fq_name = fq_name.into();
        let help = help.into();
        let variable_labels: Vec<String> = variable_labels.into_iter().map(Into::into).collect();

        if !is_valid_metric_name(&fq_name) {
            return Err(EsPushError::InvalidMetric(format!("{fq_name:?} is not a valid metric name")));
        }
        if help.is_empty() {
            return Err(EsPushError::InvalidMetric(format!("{fq_name}: help text must not be empty")));
        }

        let mut seen = HashSet::with_capacity(variable_labels.len());
        for label in &variable_labels {
            if !is_valid_label_name(label) {
                return Err(EsPushError::InvalidMetric(format!(
                    "{fq_name}: {label:?} is not a valid label name"
                )));
            }
            if RESERVED_FIELDS.contains(&label.as_str()) || label.starts_with(QUANTILE_FIELD_PREFIX) {
                return Err(EsPushError::InvalidMetric(format!(
                    "{fq_name}: label name {label:?} collides with a document field"
                )));
            }
            if !seen.insert(label.as_str()) {
                return Err(EsPushError::InvalidMetric(format!(
                    "{fq_name}: duplicate label name {label:?}"
                )));
            }
        }

        Ok(Self {
            fq_name,
            help,
            variable_labels,
        })
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn variable_labels(&self) -> &[String] {
        &self.variable_labels
    }

    /// Two descriptors are interchangeable only if name and label order match.
    pub fn is_compatible(&self, other: &Desc) -> bool {
        self.fq_name == other.fq_name && self.variable_labels == other.variable_labels
    }
}

/// Join namespace, subsystem and name with `_`, skipping empty parts.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
