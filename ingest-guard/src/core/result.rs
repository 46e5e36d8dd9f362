//! Validation result types.

use super::CellError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of problem an issue describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCode {
    /// A schema field has no column in the table
    MissingLabel,
    /// A column is not declared in the schema
    ExtraLabel,
    /// A cell could not be coerced to its field type
    TypeError,
    /// A required cell is empty
    RequiredField,
    /// A row has fewer cells than the header
    MissingCell,
    /// A row has more cells than the header
    ExtraCell,
    /// A custom constraint check flagged the cell
    CustomConstraint,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::MissingLabel => "missing-label",
            IssueCode::ExtraLabel => "extra-label",
            IssueCode::TypeError => "type-error",
            IssueCode::RequiredField => "required-field",
            IssueCode::MissingCell => "missing-cell",
            IssueCode::ExtraCell => "extra-cell",
            IssueCode::CustomConstraint => "custom-constraint",
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single problem found in a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// The kind of problem
    pub code: IssueCode,
    /// Name of the table (usually its file path)
    pub table: String,
    /// Row position, for cell-level issues
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    /// Field name, when the issue concerns one field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Name of the custom check that raised the issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check: Option<String>,
    /// A description of the issue
    pub message: String,
}

impl ValidationIssue {
    /// An issue about the table's header rather than a cell.
    pub fn header(
        code: IssueCode,
        table: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            table: table.into(),
            row: None,
            field: Some(field.into()),
            check: None,
            message: message.into(),
        }
    }

    /// An issue about one cell.
    pub fn cell(
        code: IssueCode,
        table: impl Into<String>,
        row: usize,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            table: table.into(),
            row: Some(row),
            field: Some(field.into()),
            check: None,
            message: message.into(),
        }
    }

    /// An issue about a whole row.
    pub fn row(
        code: IssueCode,
        table: impl Into<String>,
        row: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            table: table.into(),
            row: Some(row),
            field: None,
            check: None,
            message: message.into(),
        }
    }

    /// Wraps a cell error emitted by a custom check.
    pub fn from_cell_error(table: impl Into<String>, check: &str, error: CellError) -> Self {
        Self {
            code: IssueCode::CustomConstraint,
            table: table.into(),
            row: Some(error.row),
            field: Some(error.field),
            check: Some(check.to_string()),
            message: error.note,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.row, &self.field) {
            (Some(row), Some(field)) => write!(
                f,
                "{} (row {row}, column \"{field}\"): {}",
                self.table, self.message
            ),
            (Some(row), None) => write!(f, "{} (row {row}): {}", self.table, self.message),
            (None, Some(field)) => {
                write!(f, "{} (column \"{field}\"): {}", self.table, self.message)
            }
            _ => write!(f, "{}: {}", self.table, self.message),
        }
    }
}

/// Counters collected during validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationMetrics {
    /// Number of tables validated
    pub tables_validated: usize,
    /// Number of data rows seen across all tables
    pub rows_validated: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u64,
}

/// A validation report containing all issues found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Name of the validation run (usually the schema file)
    pub name: String,
    /// Timestamp when the validation was run (ISO 8601 format)
    pub timestamp: String,
    /// Overall validation metrics
    pub metrics: ValidationMetrics,
    /// List of issues, in table then row order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Creates an empty report.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            metrics: ValidationMetrics::default(),
            issues: Vec::new(),
        }
    }

    /// Adds an issue to the report.
    pub fn add_issue(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns true if any issue was found.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Gets all issues with a specific code.
    pub fn issues_by_code(&self, code: IssueCode) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|issue| issue.code == code).collect()
    }

    /// Gets all issues for one table.
    pub fn issues_for_table(&self, table: &str) -> Vec<&ValidationIssue> {
        self.issues.iter().filter(|issue| issue.table == table).collect()
    }
}

/// The result of validating one or more tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ValidationResult {
    /// No issues were found
    Success {
        /// Detailed report
        report: ValidationReport,
    },
    /// At least one issue was found
    Failure {
        /// Detailed report containing the issues
        report: ValidationReport,
    },
}

impl ValidationResult {
    /// Classifies a finished report.
    pub fn from_report(report: ValidationReport) -> Self {
        if report.has_issues() {
            ValidationResult::Failure { report }
        } else {
            ValidationResult::Success { report }
        }
    }

    /// Returns true if the validation succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, ValidationResult::Success { .. })
    }

    /// Returns true if the validation failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, ValidationResult::Failure { .. })
    }

    /// Returns the validation report.
    pub fn report(&self) -> &ValidationReport {
        match self {
            ValidationResult::Success { report } => report,
            ValidationResult::Failure { report } => report,
        }
    }
}
