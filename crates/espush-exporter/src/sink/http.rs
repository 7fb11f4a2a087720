//! HTTP `PUT` sink for document stores with a REST document API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;

use espush_core::error::{EsPushError, Result};

use super::DocumentSink;

const JSON_CONTENT_TYPE: &str = "application/json;charset=UTF-8";

/// Pushes each document with `PUT <destination>`. No retries.
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpSink {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EsPushError::Config(format!("http client build failed: {e}")))?;
        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl DocumentSink for HttpSink {
    async fn push(&self, destination: &str, document: Bytes) -> Result<()> {
        let response = self
            .client
            .put(destination)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(document)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EsPushError::Timeout {
                        destination: destination.to_owned(),
                        timeout_ms: self.timeout.as_millis() as u64,
                    }
                } else {
                    EsPushError::Sink {
                        destination: destination.to_owned(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(EsPushError::Sink {
                destination: destination.to_owned(),
                reason: format!("unexpected status {status}"),
            });
        }
        Ok(())
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
