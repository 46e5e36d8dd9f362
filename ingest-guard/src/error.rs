//! Error types for the ingest-guard validation library.
//!
//! Violations found in submitted data are never errors in this sense: they
//! are reported as [`CellError`](crate::core::CellError)s and collected into a
//! [`ValidationReport`](crate::core::ValidationReport). `IngestError` covers
//! everything that stops a validation pass from running at all.

use thiserror::Error;

/// The main error type for the ingest-guard library.
#[derive(Error, Debug)]
pub enum IngestError {
    /// A schema declares a constraint the checks cannot work with.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A schema document could not be read or is inconsistent.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Error from data source operations.
    #[error("Data source error: {message}")]
    DataSource {
        /// Type of data source (e.g., "TSV")
        source_type: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The URL status cache could not be read or written.
    #[error("Cache error: {0}")]
    Cache(String),

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, IngestError>`.
pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Creates a new data source error.
    pub fn data_source(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new data source error with a source error.
    pub fn data_source_with_source(
        source_type: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::DataSource {
            source_type: source_type.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Returns true if the error was caused by the caller's input rather than
    /// by a defect in this library.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            IngestError::Configuration(_)
                | IngestError::Schema(_)
                | IngestError::DataSource { .. }
                | IngestError::Io(_)
        )
    }
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for IngestError {
    fn from(err: serde_yaml::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<IngestError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| wrap(msg, e.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(&f(), e.into()))
    }
}

// Keeps the variant so callers can still tell user errors from bugs.
fn wrap(msg: &str, err: IngestError) -> IngestError {
    match err {
        IngestError::Configuration(inner) => IngestError::Configuration(format!("{msg}: {inner}")),
        IngestError::Schema(inner) => IngestError::Schema(format!("{msg}: {inner}")),
        IngestError::Cache(inner) => IngestError::Cache(format!("{msg}: {inner}")),
        IngestError::Io(inner) => IngestError::Io(std::io::Error::new(
            inner.kind(),
            format!("{msg}: {inner}"),
        )),
        IngestError::Internal(inner) => IngestError::Internal(format!("{msg}: {inner}")),
        other => IngestError::Internal(format!("{msg}: {other}")),
    }
}
