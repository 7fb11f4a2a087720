//! Snapshot & export pipeline.
//!
//! One export cycle gathers every registered family, reads each instrument's
//! value, turns counters into per-cycle deltas, builds one flat JSON document
//! per instrument, and pushes it to a [`DocumentSink`](crate::sink::DocumentSink).

mod cache;
pub mod document;
mod exporter;

pub use cache::LastValueCache;
pub use exporter::{ExportReport, Exporter};
