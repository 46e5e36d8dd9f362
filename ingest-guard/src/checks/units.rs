//! Conditional units check.

use crate::core::{CellError, NoteTemplate, Row, RowCheck};
use crate::prelude::*;
use std::collections::BTreeMap;

/// Requires a units field whenever the field it describes is filled.
///
/// A controlling value of `0` (or `false`) counts as filled. The units field
/// itself counts as empty when null, an empty string, zero or `false`. If the
/// controlling field is not a column of the table, nothing is required.
#[derive(Debug)]
pub struct UnitsCheck {
    units_for: BTreeMap<String, String>,
    template: NoteTemplate,
}

impl UnitsCheck {
    pub const DEFAULT_TEMPLATE: &'static str = "Required when {units_for} is filled";

    /// Creates the check from units field -> controlling field.
    pub fn new(units_for: BTreeMap<String, String>) -> Self {
        Self {
            units_for,
            template: NoteTemplate::new(Self::DEFAULT_TEMPLATE),
        }
    }

    /// Replaces the note template. Placeholder: `{units_for}`.
    pub fn with_template(mut self, template: impl Into<NoteTemplate>) -> Self {
        self.template = template.into();
        self
    }
}

impl RowCheck for UnitsCheck {
    fn name(&self) -> &str {
        "units_for"
    }

    fn check(&mut self, row: &Row) -> Result<Vec<CellError>> {
        Ok(row
            .iter()
            .filter_map(|(field, value)| {
                let controlling = self.units_for.get(field)?;
                let filled = row.get(controlling).is_some_and(|v| v.is_filled());
                (filled && !value.is_truthy()).then(|| {
                    let note = self.template.render(&[("units_for", controlling.clone())]);
                    CellError::from_row(row, field, note)
                })
            })
            .collect())
    }
}
