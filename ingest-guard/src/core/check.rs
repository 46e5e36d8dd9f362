//! The row check trait and the cell errors checks emit.

use super::Row;
use crate::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};

/// A violation found in one cell of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellError {
    /// 1-based row position in the source (header is row 1)
    pub row: usize,
    /// The field the violation was found in
    pub field: String,
    /// Human-readable description of the violation
    pub note: String,
}

impl CellError {
    /// Creates a cell error located at `row`.
    pub fn from_row(row: &Row, field: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            row: row.number(),
            field: field.into(),
            note: note.into(),
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "row {}, column \"{}\": {}",
            self.row, self.field, self.note
        )
    }
}

/// A row validator built from a schema.
///
/// One instance lives for exactly one validation pass over one table. The
/// driver calls [`check`](RowCheck::check) once per row, in source order;
/// checks may keep state between calls but must not assume rows are replayed.
///
/// # Examples
///
/// ```rust
/// use ingest_guard::core::{CellError, Row, RowCheck};
/// use ingest_guard::prelude::*;
///
/// #[derive(Debug)]
/// struct NoWhitespace;
///
/// impl RowCheck for NoWhitespace {
///     fn name(&self) -> &str {
///         "no_whitespace"
///     }
///
///     fn check(&mut self, row: &Row) -> Result<Vec<CellError>> {
///         Ok(row
///             .iter()
///             .filter(|(_, v)| v.as_str().is_some_and(|s| s != s.trim()))
///             .map(|(name, _)| CellError::from_row(row, name, "surrounding whitespace"))
///             .collect())
///     }
/// }
/// ```
pub trait RowCheck: Debug {
    /// Returns the name of the check.
    fn name(&self) -> &str;

    /// Validates one row, returning zero or more cell errors.
    ///
    /// An `Err` means the check itself could not run (e.g. the URL cache
    /// could not be written), not that the row is invalid.
    fn check(&mut self, row: &Row) -> Result<Vec<CellError>>;
}

/// A boxed check for use in collections.
pub type BoxedRowCheck = Box<dyn RowCheck>;

/// A note template with `{name}` placeholders.
///
/// Placeholder names are part of the output contract: report consumers match
/// on the rendered text, so the default templates must not change wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteTemplate {
    text: String,
}

impl NoteTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Substitutes each `{name}` with its value. Unknown placeholders are left as-is.
    pub fn render(&self, vars: &[(&str, String)]) -> String {
        let mut out = self.text.clone();
        for (name, value) in vars {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl From<&str> for NoteTemplate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_render() {
        let template = NoteTemplate::new("URL returned {status}: \"{url}\"");
        let note = template.render(&[
            ("status", 404.to_string()),
            ("url", "http://x/2".to_string()),
        ]);
        assert_eq!(note, "URL returned 404: \"http://x/2\"");
    }

    #[test]
    fn test_template_leaves_unknown_placeholders() {
        let template = NoteTemplate::from("{known} and {unknown}");
        assert_eq!(template.render(&[("known", "1".to_string())]), "1 and {unknown}");
    }

    #[test]
    fn test_cell_error_display() {
        let row = Row::new(5);
        let err = CellError::from_row(&row, "sample_id", "bad");
        assert_eq!(err.row, 5);
        assert_eq!(err.to_string(), "row 5, column \"sample_id\": bad");
    }
}
