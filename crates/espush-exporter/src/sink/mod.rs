//! Document sinks: where exported documents are pushed.

pub mod http;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use espush_core::error::Result;

pub use http::HttpSink;

/// Accepts one serialized document per call.
///
/// The sink owns transport, retries and connection reuse. The exporter only
/// bounds each push by [`DocumentSink::timeout`].
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn push(&self, destination: &str, document: Bytes) -> Result<()>;
    fn timeout(&self) -> Duration;
}
