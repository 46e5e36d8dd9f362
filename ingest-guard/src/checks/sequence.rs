//! Sequence run check.
//!
//! Catches fill-down mistakes: a block of rows whose values only differ by an
//! incrementing numeric suffix (`A1`, `A2`, `A3`, ...) is usually a spreadsheet
//! drag that should have been reordered or deduplicated.

use crate::core::{CellError, NoteTemplate, Row, RowCheck, Value};
use crate::prelude::*;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use tracing::trace;

// Non-greedy prefix, then the full run of digits ending the string.
static PREFIX_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?P<prefix>.*?)(?P<number>[0-9]+)$").expect("static regex is valid")
});

/// A value split into its text prefix and trailing number.
///
/// The number is kept as decimal digits without leading zeros, so suffixes
/// of any length compare exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Numbered {
    prefix: String,
    digits: String,
}

impl Numbered {
    /// Returns `None` for empty values and values without trailing digits.
    fn parse(value: &str) -> Option<Self> {
        if value.is_empty() {
            return None;
        }
        let captures = PREFIX_NUMBER.captures(value)?;
        let digits = captures["number"].trim_start_matches('0');
        Some(Self {
            prefix: captures["prefix"].to_string(),
            digits: if digits.is_empty() { "0" } else { digits }.to_string(),
        })
    }

    fn continues(&self, previous: &Numbered) -> bool {
        self.prefix == previous.prefix && increment(&previous.digits) == self.digits
    }
}

/// Adds one to a run of decimal digits.
fn increment(digits: &str) -> String {
    let mut bytes = digits.as_bytes().to_vec();
    for byte in bytes.iter_mut().rev() {
        if *byte == b'9' {
            *byte = b'0';
        } else {
            *byte += 1;
            return String::from_utf8_lossy(&bytes).into_owned();
        }
    }
    format!("1{}", String::from_utf8_lossy(&bytes))
}

/// Per-field run state.
#[derive(Debug, Clone)]
struct Run {
    last: Numbered,
    length: usize,
}

/// Flags rows once a run of consecutive incrementing values reaches a limit.
///
/// The check keeps, per field, the last parsed value and the current run
/// length. Every row at or past the limit is flagged, not only the row where
/// the limit is first reached.
#[derive(Debug)]
pub struct SequenceLimitCheck {
    limits: BTreeMap<String, usize>,
    runs: HashMap<String, Run>,
    template: NoteTemplate,
}

impl SequenceLimitCheck {
    pub const DEFAULT_TEMPLATE: &'static str =
        "there is a run of {run_length} sequential items: Limit is {limit}. If correct, reorder rows.";

    /// Creates the check from field name -> limit.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Configuration`] if any limit is below 2.
    pub fn new(limits: BTreeMap<String, i64>) -> Result<Self> {
        let limits: BTreeMap<String, usize> = limits
            .into_iter()
            .map(|(field, limit)| match usize::try_from(limit) {
                Ok(limit) if limit > 1 => Ok((field, limit)),
                _ => Err(IngestError::Configuration(format!(
                    "field '{field}': sequence_limit is {limit}, the lowest allowed limit is 2"
                ))),
            })
            .collect::<Result<_>>()?;
        Ok(Self {
            limits,
            runs: HashMap::new(),
            template: NoteTemplate::new(Self::DEFAULT_TEMPLATE),
        })
    }

    /// Replaces the note template. Placeholders: `{run_length}`, `{limit}`.
    pub fn with_template(mut self, template: impl Into<NoteTemplate>) -> Self {
        self.template = template.into();
        self
    }

    /// Current run length for `field`, if a run is being tracked.
    pub fn run_length(&self, field: &str) -> Option<usize> {
        self.runs.get(field).map(|run| run.length)
    }

    /// Advances the run for `field` and returns its new length, or `None` if
    /// the value cannot take part in a run.
    fn advance(&mut self, field: &str, value: &Value) -> Option<usize> {
        // Typed cells (dates, numbers) are compared by their text form.
        let Some(current) = Numbered::parse(&value.to_string()) else {
            self.runs.remove(field);
            return None;
        };

        match self.runs.get_mut(field) {
            Some(run) if current.continues(&run.last) => {
                run.length += 1;
                run.last = current;
                Some(run.length)
            }
            _ => {
                self.runs.insert(
                    field.to_string(),
                    Run {
                        last: current,
                        length: 1,
                    },
                );
                Some(1)
            }
        }
    }
}

impl RowCheck for SequenceLimitCheck {
    fn name(&self) -> &str {
        "sequence_limit"
    }

    fn check(&mut self, row: &Row) -> Result<Vec<CellError>> {
        let mut errors = Vec::new();
        for (field, value) in row.iter() {
            let Some(&limit) = self.limits.get(field) else {
                continue;
            };
            let Some(run_length) = self.advance(field, value) else {
                continue;
            };
            trace!(row = row.number(), field, run_length, "Sequence run");
            if run_length >= limit {
                let note = self
                    .template
                    .render(&[
                        ("run_length", run_length.to_string()),
                        ("limit", limit.to_string()),
                    ]);
                errors.push(CellError::from_row(row, field, note));
            }
        }
        Ok(errors)
    }
}
