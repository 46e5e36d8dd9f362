//! Core validation types.
//!
//! ## Overview
//!
//! - **[`Schema`]**: ordered [`FieldDescriptor`]s with types, `required` and
//!   custom constraint declarations
//! - **[`Row`]**: one typed data row, keyed by column name
//! - **[`RowCheck`]**: a stateful per-row check emitting [`CellError`]s
//! - **[`Validator`]**: runs header, type, required and custom checks over
//!   loaded tables
//! - **[`ValidationResult`]**: the classified [`ValidationReport`]
//!
//! ## Architecture
//!
//! ```text
//! Validator
//!     ├── header check        -> missing-label / extra-label
//!     ├── type coercion       -> type-error
//!     ├── required            -> required-field
//!     └── custom checks (per table, in order)
//!         ├── url
//!         ├── sequence_limit
//!         ├── units_for
//!         └── forbid_na       -> custom-constraint
//! ```

mod check;
mod result;
mod row;
mod schema;
mod validator;
mod value;

pub use check::{BoxedRowCheck, CellError, NoteTemplate, RowCheck};
pub use result::{IssueCode, ValidationIssue, ValidationMetrics, ValidationReport, ValidationResult};
pub use row::Row;
pub use schema::{FieldConstraints, FieldDescriptor, FieldType, Schema};
pub use validator::Validator;
pub use value::{Number, Value};
