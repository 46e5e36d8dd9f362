//! Prelude for commonly used types and traits in ingest-guard.

pub use crate::config::ValidatorConfig;
pub use crate::core::{RowCheck, Validator};
pub use crate::error::{ErrorContext, IngestError, Result};
pub use crate::formatters::{FormatterConfig, ResultFormatter};
pub use crate::logging::LogConfig;
