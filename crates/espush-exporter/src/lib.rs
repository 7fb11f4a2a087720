//! espush exporter library entry.
//!
//! This crate wires the metric registry, the snapshot & export pipeline, and
//! document sinks into a push-based exporter. It is consumed by the binary
//! (`main.rs`) and by integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod config;
pub mod export;
pub mod obs;
pub mod registry;
pub mod sink;
pub mod telemetry;
