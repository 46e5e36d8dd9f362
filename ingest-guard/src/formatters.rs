//! Result formatting for validation reports.
//!
//! # Examples
//!
//! ```rust
//! use ingest_guard::core::{IssueCode, ValidationIssue, ValidationReport, ValidationResult};
//! use ingest_guard::formatters::{FormatterConfig, HumanFormatter, ResultFormatter};
//!
//! let mut report = ValidationReport::new("schema.yaml");
//! report.add_issue(ValidationIssue::cell(
//!     IssueCode::CustomConstraint,
//!     "metadata.tsv",
//!     3,
//!     "sample_id",
//!     "there is a run of 2 sequential items: Limit is 2. If correct, reorder rows.",
//! ));
//! let result = ValidationResult::from_report(report);
//!
//! let formatter = HumanFormatter::with_config(FormatterConfig::plain());
//! let output = formatter.format(&result).unwrap();
//! assert!(output.contains("metadata.tsv (row 3, column \"sample_id\"): there is a run of 2 sequential items: Limit is 2. If correct, reorder rows."));
//! ```

use crate::core::{ValidationReport, ValidationResult};
use crate::prelude::*;

/// Configuration options for formatting validation results.
#[derive(Debug, Clone)]
pub struct FormatterConfig {
    /// Include the summary counters
    pub include_metrics: bool,
    /// Maximum number of issues to display (-1 for all)
    pub max_issues: i32,
    /// Whether to use colorized output (for the human formatter)
    pub use_colors: bool,
    /// Whether to include the report timestamp
    pub include_timestamps: bool,
    /// Append a note with the validation time and tool version
    pub add_notes: bool,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            include_metrics: true,
            max_issues: -1,
            use_colors: true,
            include_timestamps: false,
            add_notes: false,
        }
    }
}

impl FormatterConfig {
    /// Only the issue lines, uncolored.
    pub fn plain() -> Self {
        Self {
            include_metrics: false,
            use_colors: false,
            ..Self::default()
        }
    }

    pub fn with_metrics(mut self, include: bool) -> Self {
        self.include_metrics = include;
        self
    }

    /// Sets the maximum number of issues to display.
    pub fn with_max_issues(mut self, max: i32) -> Self {
        self.max_issues = max;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn with_add_notes(mut self, add_notes: bool) -> Self {
        self.add_notes = add_notes;
        self
    }

    fn issue_limit(&self, total: usize) -> usize {
        if self.max_issues < 0 {
            total
        } else {
            total.min(self.max_issues as usize)
        }
    }
}

/// Formats a [`ValidationResult`] for output.
pub trait ResultFormatter {
    /// Formats a validation result into a string representation.
    fn format(&self, result: &ValidationResult) -> Result<String>;
}

/// The note appended to reports when `add_notes` is set.
pub fn context_note(report: &ValidationReport) -> String {
    format!(
        "Time: {}\nVersion: {} {}",
        report.timestamp,
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}

/// Formats results as pretty-printed JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonFormatter {
    config: FormatterConfig,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl ResultFormatter for JsonFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        let mut output = serde_json::to_value(filter_result(result, &self.config))?;
        if let (true, Some(object)) = (self.config.add_notes, output.as_object_mut()) {
            object.insert(
                "note".to_string(),
                serde_json::Value::String(context_note(result.report())),
            );
        }
        serde_json::to_string_pretty(&output)
            .map_err(|e| IngestError::Internal(format!("Failed to serialize result to JSON: {e}")))
    }
}

/// Formats results as a text list, one line per issue.
#[derive(Debug, Clone, Default)]
pub struct HumanFormatter {
    config: FormatterConfig,
}

impl HumanFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FormatterConfig) -> Self {
        Self { config }
    }

    fn paint(&self, text: &str, color: &str) -> String {
        if self.config.use_colors {
            format!("\x1b[{color}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

impl ResultFormatter for HumanFormatter {
    fn format(&self, result: &ValidationResult) -> Result<String> {
        let config = &self.config;
        let report = result.report();
        let mut lines = Vec::new();

        if result.is_success() {
            lines.push(self.paint("No errors!", "32"));
        } else {
            let shown = config.issue_limit(report.issues.len());
            lines.extend(report.issues[..shown].iter().map(|issue| issue.to_string()));
            if report.issues.len() > shown {
                lines.push(self.paint(
                    &format!(
                        "... and {} more issues (use --max-issues to show more)",
                        report.issues.len() - shown
                    ),
                    "33",
                ));
            }
        }

        if config.include_metrics {
            lines.push(String::new());
            lines.push(format!(
                "Validated {} rows in {} tables: {} issues ({}ms)",
                report.metrics.rows_validated,
                report.metrics.tables_validated,
                report.issues.len(),
                report.metrics.execution_time_ms
            ));
        }
        if config.include_timestamps {
            lines.push(format!("Timestamp: {}", report.timestamp));
        }
        if config.add_notes {
            lines.push(String::new());
            lines.push(context_note(report));
        }

        let mut output = lines.join("\n");
        output.push('\n');
        Ok(output)
    }
}

fn filter_result(result: &ValidationResult, config: &FormatterConfig) -> ValidationResult {
    let mut report = result.report().clone();
    report.issues.truncate(config.issue_limit(report.issues.len()));
    if !config.include_timestamps {
        report.timestamp = String::new();
    }
    match result {
        ValidationResult::Success { .. } => ValidationResult::Success { report },
        ValidationResult::Failure { .. } => ValidationResult::Failure { report },
    }
}
