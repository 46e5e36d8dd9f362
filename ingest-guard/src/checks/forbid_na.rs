//! Forbidden placeholder check.

use crate::core::{CellError, NoteTemplate, Row, RowCheck};
use crate::prelude::*;
use std::collections::BTreeSet;

/// Flags string cells that spell out "NA" or "N/A" instead of being left empty.
///
/// Matching only upper-cases the value: surrounding whitespace is not
/// stripped, so `"n/a "` passes.
#[derive(Debug)]
pub struct ForbidNaCheck {
    fields: BTreeSet<String>,
    template: NoteTemplate,
}

impl ForbidNaCheck {
    pub const DEFAULT_TEMPLATE: &'static str = "\"N/A\" fields should just be left empty";

    pub fn new(fields: BTreeSet<String>) -> Self {
        Self {
            fields,
            template: NoteTemplate::new(Self::DEFAULT_TEMPLATE),
        }
    }

    /// Replaces the note template. No placeholders are substituted.
    pub fn with_template(mut self, template: impl Into<NoteTemplate>) -> Self {
        self.template = template.into();
        self
    }
}

/// True for values that upper-case to exactly `NA` or `N/A`.
pub(crate) fn is_na_placeholder(value: &str) -> bool {
    matches!(value.to_uppercase().as_str(), "NA" | "N/A")
}

impl RowCheck for ForbidNaCheck {
    fn name(&self) -> &str {
        "forbid_na"
    }

    fn check(&mut self, row: &Row) -> Result<Vec<CellError>> {
        Ok(row
            .iter()
            .filter(|(field, value)| {
                self.fields.contains(*field) && value.as_str().is_some_and(is_na_placeholder)
            })
            .map(|(field, _)| CellError::from_row(row, field, self.template.render(&[])))
            .collect())
    }
}
