//! espush core: label-indexed instrument vectors, hashing, and the shared error type.
//!
//! This crate holds everything a measurement call site touches: metric
//! descriptors, the concurrent hash-bucketed instrument map, label currying,
//! and the built-in counter/gauge/summary instruments. It carries no runtime
//! or transport dependencies; exporting lives in `espush-exporter`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `EsPushError`/`Result` so instrumented
//! processes never crash on a bad label set.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod collector;
pub mod counter;
pub mod desc;
pub mod error;
pub mod gauge;
pub mod hash;
pub mod metric;
pub mod summary;
pub mod vec;

pub use collector::{CollectedMetric, Collector};
pub use counter::{Counter, CounterVec};
pub use desc::{build_fq_name, Desc};
pub use error::{ErrorKind, EsPushError, Result};
pub use gauge::{Gauge, GaugeVec};
pub use hash::{Fnv64a, LabelHasher, SEPARATOR_BYTE};
pub use metric::{Metric, MetricKind, MetricValue, Quantile};
pub use summary::{Summary, SummaryOpts, SummaryVec};
pub use vec::{CurriedLabel, MetricVec};
