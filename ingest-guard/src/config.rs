//! Configuration for a validation run.

use crate::cache::{HttpFetcher, UrlStatusCache};
use crate::logging::LogConfig;
use crate::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings shared by every table in one validation run.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    offline: bool,
    optional_fields: BTreeSet<String>,
    cache_path: Option<PathBuf>,
    http_timeout: Duration,
    add_notes: bool,
    log: LogConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            offline: false,
            optional_fields: BTreeSet::new(),
            cache_path: None,
            http_timeout: HttpFetcher::DEFAULT_TIMEOUT,
            add_notes: false,
            log: LogConfig::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A configuration that never touches the network.
    pub fn offline() -> Self {
        Self::default().with_offline(true)
    }

    /// Skip checks that need network access.
    pub fn with_offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Fields that may be missing from a table's header. If present they are
    /// still validated.
    pub fn with_optional_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Store URL statuses at `path` instead of the default location.
    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = Some(path.into());
        self
    }

    /// Set the timeout of a single URL lookup.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Append a context note to rendered reports.
    pub fn with_add_notes(mut self, add_notes: bool) -> Self {
        self.add_notes = add_notes;
        self
    }

    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    pub fn optional_fields(&self) -> &BTreeSet<String> {
        &self.optional_fields
    }

    pub fn is_optional(&self, field: &str) -> bool {
        self.optional_fields.contains(field)
    }

    /// The explicitly configured cache path, if any.
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// The cache path to use: the configured one, else the default location.
    pub fn resolved_cache_path(&self) -> Result<PathBuf> {
        match &self.cache_path {
            Some(path) => Ok(path.clone()),
            None => UrlStatusCache::default_path(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        self.http_timeout
    }

    pub fn add_notes(&self) -> bool {
        self.add_notes
    }

    pub fn log_config(&self) -> &LogConfig {
        &self.log
    }
}
