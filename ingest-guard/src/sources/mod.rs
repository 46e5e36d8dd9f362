//! Table sources for the validator.
//!
//! A source produces a [`RawTable`]: the header and the text of every cell,
//! before any typing against a schema.

use crate::prelude::*;
use async_trait::async_trait;
use std::fmt::Debug;
use std::path::PathBuf;
use tracing::instrument;

mod tsv;

pub use tsv::{TsvOptions, TsvSource};

/// A loaded table: header names plus untyped cells in file order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Name used in reports, usually the file path
    pub name: String,
    /// Column names in file order
    pub header: Vec<String>,
    /// One entry per data row; `None` marks an empty cell
    pub records: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Builds a table from string cells, treating `""` as empty.
    pub fn from_strings<H, R>(name: impl Into<String>, header: H, rows: R) -> Self
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator,
        <R::Item as IntoIterator>::Item: Into<String>,
    {
        Self {
            name: name.into(),
            header: header.into_iter().map(Into::into).collect(),
            records: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| {
                            let cell: String = cell.into();
                            (!cell.is_empty()).then_some(cell)
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

/// Something that can be loaded into a [`RawTable`].
///
/// # Examples
///
/// ```rust,no_run
/// use ingest_guard::sources::{TableSource, TsvSource};
///
/// # async fn example() -> ingest_guard::prelude::Result<()> {
/// let table = TsvSource::new("metadata.tsv").load().await?;
/// println!("{} rows", table.records.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TableSource: Debug + Send + Sync {
    /// Name used to identify the table in reports.
    fn name(&self) -> String;

    /// Reads the whole table.
    async fn load(&self) -> Result<RawTable>;
}

/// Loads each TSV file in order.
#[instrument(skip(paths), fields(files = paths.len()))]
pub async fn load_tsv_files(paths: &[PathBuf]) -> Result<Vec<RawTable>> {
    let mut tables = Vec::with_capacity(paths.len());
    for path in paths {
        tables.push(TsvSource::new(path).load().await?);
    }
    Ok(tables)
}
