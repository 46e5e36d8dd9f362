//! Network lookups behind the URL status cache.

use crate::prelude::*;
use reqwest::blocking::Client;
use std::fmt::Debug;
use std::time::Duration;
use tracing::{debug, instrument};

/// Resolves a URL to an HTTP status code.
///
/// `Err` carries the failure's description (connection refused, timeout,
/// malformed URL, ...), which is what gets cached for that URL.
pub trait UrlFetcher: Debug + Send + Sync {
    fn fetch_status(&self, url: &str) -> std::result::Result<u16, String>;
}

/// Blocking HTTP GET fetcher. Only the status code is looked at.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Default timeout for a single request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a fetcher whose requests give up after `timeout`.
    ///
    /// Must not be called from inside an async runtime.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IngestError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl UrlFetcher for HttpFetcher {
    #[instrument(skip(self))]
    fn fetch_status(&self, url: &str) -> std::result::Result<u16, String> {
        let response = self.client.get(url).send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        debug!(status, "Fetched URL");
        Ok(status)
    }
}
