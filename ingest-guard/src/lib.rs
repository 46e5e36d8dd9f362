//! # ingest-guard - Row-level validation of TSV metadata
//!
//! ingest-guard checks tab-separated metadata submissions against a
//! declarative schema. Besides header, type and `required` checks, each field
//! may declare custom constraints that are evaluated row by row:
//!
//! - **`url`**: `prefix + value` must answer HTTP 200 (network results are
//!   cached on disk)
//! - **`sequence_limit`**: no more than `limit - 1` consecutive values whose
//!   trailing numbers count up by one
//! - **`units_for`**: a units field must be filled whenever the field it
//!   describes is
//! - **`forbid_na`**: `NA` / `N/A` spellings are rejected in favor of empty
//!   cells
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ingest_guard::core::Schema;
//! use ingest_guard::formatters::HumanFormatter;
//! use ingest_guard::prelude::*;
//! use ingest_guard::sources::load_tsv_files;
//!
//! # fn example() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let schema = Schema::from_path("schema.yaml")?;
//! let validator = Validator::new(schema, ValidatorConfig::offline())?;
//!
//! let runtime = tokio::runtime::Runtime::new()?;
//! let tables = runtime.block_on(load_tsv_files(&["metadata.tsv".into()]))?;
//!
//! let result = validator.validate(&tables)?;
//! print!("{}", HumanFormatter::new().format(&result)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`core`**: schemas, typed rows, the `RowCheck` trait, the `Validator`
//!   and its reports
//! - **`checks`**: the custom constraint checks and the factory that builds
//!   them from a schema
//! - **`cache`**: the persistent URL status cache and its HTTP fetcher
//! - **`sources`**: TSV loading through DataFusion
//! - **`formatters`**: text and JSON rendering of results
//! - **`config`**, **`logging`**, **`error`**: ambient plumbing
//!
//! Loading is async; checking is synchronous and may block on the network,
//! so tables are loaded to completion before any check runs.

pub mod cache;
pub mod checks;
pub mod config;
pub mod core;
pub mod error;
pub mod formatters;
pub mod logging;
pub mod prelude;
pub mod sources;

#[cfg(test)]
pub(crate) mod test_helpers;
