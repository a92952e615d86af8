//! Source image retrieval over HTTP(S).
//!
//! One outbound GET per call, no retries, bounded by the configured request
//! and connect timeouts and by a maximum body size.

use crate::config::FetcherConfig;
use crate::error::FetchError;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Url;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Retrieves the raw bytes of a source image.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

/// `reqwest`-backed fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpFetcher {
    /// Build a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Client` if the HTTP client cannot be created
    /// (e.g., TLS backend initialisation failure).
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    /// Wrap an existing client, e.g. one shared with other components.
    pub fn with_client(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn too_large(&self, size: u64) -> FetchError {
        FetchError::TooLarge {
            size,
            max_size: self.max_bytes,
        }
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        let start = Instant::now();
        let parsed = parse_source_url(url)?;

        let mut response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = url, status = status.as_u16(), "Source returned error status");
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(declared) = response.content_length() {
            if declared > self.max_bytes {
                return Err(self.too_large(declared));
            }
        }

        let capacity = response
            .content_length()
            .unwrap_or(0)
            .min(self.max_bytes) as usize;
        let mut body = BytesMut::with_capacity(capacity);
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| map_reqwest_error(url, e))?
        {
            let received = (body.len() + chunk.len()) as u64;
            if received > self.max_bytes {
                return Err(self.too_large(received));
            }
            body.extend_from_slice(&chunk);
        }

        debug!(
            url = url,
            bytes = body.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched source image"
        );
        Ok(body.freeze())
    }
}

/// Accept only absolute `http://` / `https://` URLs with a host.
pub fn parse_source_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(FetchError::invalid_url(
                url,
                format!("unsupported scheme '{}', expected http or https", other),
            ))
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::invalid_url(url, "missing host"));
    }
    Ok(parsed)
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::network(url, err.to_string())
    }
}
