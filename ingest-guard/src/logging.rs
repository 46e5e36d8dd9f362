//! Logging utilities and configuration for ingest-guard.
//!
//! Validation of a large submission can touch hundreds of thousands of cells,
//! so per-row and per-lookup logging is opt-in through [`LogConfig`].

/// Logging configuration for a validation pass.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether to log each row's check results
    pub log_row_details: bool,
    /// Whether to log table loading and header checks
    pub log_table_operations: bool,
    /// Whether to log URL status cache hits and misses
    pub log_cache_activity: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_row_details: false,
            log_table_operations: true,
            log_cache_activity: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging a submission.
    pub fn verbose() -> Self {
        Self {
            log_row_details: true,
            log_table_operations: true,
            log_cache_activity: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for batch runs.
    pub fn quiet() -> Self {
        Self {
            log_row_details: false,
            log_table_operations: false,
            log_cache_activity: false,
            max_field_length: 128,
        }
    }
}

/// Logs one row's outcome when row details are enabled.
#[macro_export]
macro_rules! log_row {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_row_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Logs a table-level operation when table logging is enabled.
#[macro_export]
macro_rules! log_table_op {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_table_operations {
            tracing::info!($($arg)*);
        }
    };
}

/// Logs URL status cache activity when cache logging is enabled.
#[macro_export]
macro_rules! log_cache {
    ($config:expr, debug, $($arg:tt)*) => {
        if $config.log_cache_activity {
            tracing::debug!($($arg)*);
        }
    };
    ($config:expr, info, $($arg:tt)*) => {
        if $config.log_cache_activity {
            tracing::info!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Utilities for installing a global tracing subscriber.
pub mod setup {
    use tracing::Level;

    /// Configuration for the global subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for dependencies
        pub level: Level,
        /// Log level for ingest-guard components specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for local debugging.
        pub fn development() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Creates a configuration emitting one JSON object per event.
        pub fn structured() -> Self {
            Self {
                json_format: true,
                ..Self::default()
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},ingest_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Installs the global subscriber, writing to stderr.
    ///
    /// `RUST_LOG` takes precedence over the configured filter.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use ingest_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;
    use tracing::Level;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert!(config.log_cache_activity);
        assert!(!config.log_row_details);
        assert!(config.log_table_operations);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_presets() {
        assert!(LogConfig::verbose().log_row_details);
        let quiet = LogConfig::quiet();
        assert!(!quiet.log_table_operations);
        assert!(!quiet.log_cache_activity);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
    }

    #[test]
    fn test_truncate_field_respects_char_boundaries() {
        assert_eq!(truncate_field("µµµ", 3), "µ...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(LoggingConfig::default().env_filter(), "warn,ingest_guard=info");
        assert_eq!(
            LoggingConfig::development()
                .with_crate_level(Level::TRACE)
                .env_filter(),
            "info,ingest_guard=trace"
        );
        assert_eq!(
            LoggingConfig::default().with_env_filter("off").env_filter(),
            "off"
        );
    }
}
