//! File-backed cache of URL status lookups.
//!
//! The cache is a single JSON object mapping each URL to either the HTTP
//! status it returned or the description of why the request failed:
//!
//! ```json
//! {
//!   "https://dx.doi.org/10.17504/protocols.io.abc": 200,
//!   "https://dx.doi.org/bogus": 404,
//!   "https://no-such-host.invalid/x": "error sending request for url ..."
//! }
//! ```
//!
//! Entries never expire. A failed lookup stays failed until the cache is
//! cleared with [`clear_cache_files`]. The file is re-read before and fully
//! rewritten after every miss, so two processes sharing one cache file can
//! lose each other's updates.

use super::{HttpFetcher, UrlFetcher};
use crate::logging::LogConfig;
use crate::prelude::*;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

/// File name of the cache inside the platform cache directory.
pub const CACHE_FILE_NAME: &str = "url-status-cache.json";

/// Environment variable that overrides the default cache location.
pub const CACHE_PATH_ENV: &str = "INGEST_GUARD_CACHE";

/// The outcome of resolving a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UrlStatus {
    /// The server answered with this HTTP status.
    Code(u16),
    /// The request failed before a status was received.
    Failure(String),
}

impl UrlStatus {
    /// Only an exact `200` counts as reachable.
    pub fn is_ok(&self) -> bool {
        matches!(self, UrlStatus::Code(200))
    }
}

impl fmt::Display for UrlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlStatus::Code(code) => write!(f, "{code}"),
            UrlStatus::Failure(message) => f.write_str(message),
        }
    }
}

/// Persistent URL -> [`UrlStatus`] cache.
#[derive(Debug)]
pub struct UrlStatusCache {
    path: PathBuf,
    fetcher: Box<dyn UrlFetcher>,
    log: LogConfig,
}

impl UrlStatusCache {
    /// Creates a cache stored at `path` that resolves misses with `fetcher`.
    ///
    /// Nothing is read or written until the first lookup.
    pub fn new(path: impl Into<PathBuf>, fetcher: Box<dyn UrlFetcher>) -> Self {
        Self {
            path: path.into(),
            fetcher,
            log: LogConfig::default(),
        }
    }

    /// Sets which cache events are logged.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Creates a cache that resolves misses with a blocking HTTP GET.
    pub fn with_http(path: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(path, Box::new(HttpFetcher::new(timeout)?)))
    }

    /// The well-known cache location: `$INGEST_GUARD_CACHE` if set, otherwise
    /// `url-status-cache.json` in the platform cache directory.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CACHE_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "ingest-guard", "ingest-guard")
            .map(|dirs| dirs.cache_dir().join(CACHE_FILE_NAME))
            .ok_or_else(|| {
                IngestError::Configuration("Could not determine cache directory".to_string())
            })
    }

    /// Path of the backing JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all entries, creating an empty cache file if none exists.
    pub fn load(&self) -> Result<BTreeMap<String, UrlStatus>> {
        if !self.path.exists() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| IngestError::Cache(format!("Failed to create cache directory: {e}")))?;
            }
            std::fs::write(&self.path, "{}")
                .map_err(|e| IngestError::Cache(format!("Failed to create cache file: {e}")))?;
            crate::log_cache!(self.log, info, path = %self.path.display(), "Created URL status cache");
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| IngestError::Cache(format!("Failed to read cache file: {e}")))?;
        serde_json::from_str(&text).map_err(|e| {
            IngestError::Cache(format!(
                "Cache file {} is not a valid status map: {e}",
                self.path.display()
            ))
        })
    }

    /// Returns the cached status of `url` without touching the network.
    pub fn get(&self, url: &str) -> Result<Option<UrlStatus>> {
        Ok(self.load()?.remove(url))
    }

    /// Returns the status of `url`, fetching and persisting it on a miss.
    #[instrument(skip(self))]
    pub fn resolve(&self, url: &str) -> Result<UrlStatus> {
        let mut entries = self.load()?;
        if let Some(status) = entries.get(url) {
            crate::log_cache!(self.log, debug, %status, "URL status cache hit");
            return Ok(status.clone());
        }

        crate::log_cache!(self.log, info, "Fetching un-cached url");
        let status = match self.fetcher.fetch_status(url) {
            Ok(code) => UrlStatus::Code(code),
            Err(message) => {
                warn!(error = %message, "URL lookup failed; caching the failure");
                UrlStatus::Failure(message)
            }
        };
        entries.insert(url.to_string(), status.clone());
        self.persist(&entries)?;
        Ok(status)
    }

    /// Inserts or replaces an entry without fetching.
    pub fn insert(&self, url: impl Into<String>, status: UrlStatus) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(url.into(), status);
        self.persist(&entries)
    }

    /// Deletes the cache file and any file sharing its path prefix.
    pub fn clear(&self) -> Result<usize> {
        clear_cache_files(&self.path)
    }

    // BTreeMap keeps keys sorted; pretty printing indents by two spaces.
    fn persist(&self, entries: &BTreeMap<String, UrlStatus>) -> Result<()> {
        let text = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, text)
            .map_err(|e| IngestError::Cache(format!("Failed to write cache file: {e}")))
    }
}

/// Deletes every file whose path starts with `path` and returns how many
/// were removed. Missing files are not an error.
pub fn clear_cache_files(path: &Path) -> Result<usize> {
    let pattern = format!("{}*", glob::Pattern::escape(&path.to_string_lossy()));
    let matches = glob::glob(&pattern)
        .map_err(|e| IngestError::Cache(format!("Invalid cache path pattern: {e}")))?;

    let mut removed = 0;
    for entry in matches {
        let file = entry.map_err(|e| IngestError::Cache(format!("Failed to list cache files: {e}")))?;
        if file.is_file() {
            std::fs::remove_file(&file)
                .map_err(|e| IngestError::Cache(format!("Failed to delete {}: {e}", file.display())))?;
            removed += 1;
        }
    }
    info!(path = %path.display(), removed, "Cleared URL status cache");
    Ok(removed)
}
