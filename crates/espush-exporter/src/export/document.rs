//! Flat export documents.
//!
//! Field names are a stable contract with the document store:
//! `FqName`, `Help`, `Type`, `Timestamp`, then `Value` for counters and
//! gauges, or `Sum`, `Count` and one `QUANTILE_<percent>` per objective for
//! summaries, plus one field per variable label.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

pub use espush_core::desc::quantile_field;
use espush_core::desc::Desc;
use espush_core::metric::MetricValue;

pub const FQ_NAME: &str = "FqName";
pub const HELP: &str = "Help";
pub const TYPE: &str = "Type";
pub const TIMESTAMP: &str = "Timestamp";
pub const VALUE: &str = "Value";
pub const SUM: &str = "Sum";
pub const COUNT: &str = "Count";

/// Export timestamp: UTC, RFC 3339, whole seconds.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Build the document for one instrument. For counters, `value` must
/// already carry the per-cycle delta.
pub fn build(desc: &Desc, label_values: &[String], value: &MetricValue, timestamp: &str) -> Map<String, Value> {
    let mut doc = Map::new();
    for (name, v) in desc.variable_labels().iter().zip(label_values) {
        doc.insert(name.clone(), Value::from(v.as_str()));
    }

    doc.insert(FQ_NAME.into(), Value::from(desc.fq_name()));
    doc.insert(HELP.into(), Value::from(desc.help()));
    doc.insert(TYPE.into(), Value::from(value.kind().as_str()));
    doc.insert(TIMESTAMP.into(), Value::from(timestamp));

    match value {
        MetricValue::Counter { value } | MetricValue::Gauge { value } => {
            doc.insert(VALUE.into(), Value::from(*value));
        }
        MetricValue::Summary { sum, count, quantiles } => {
            doc.insert(SUM.into(), Value::from(*sum));
            doc.insert(COUNT.into(), Value::from(*count));
            for q in quantiles {
                doc.insert(quantile_field(q.quantile), Value::from(q.value));
            }
        }
    }
    doc
}
