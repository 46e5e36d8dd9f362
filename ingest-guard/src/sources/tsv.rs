//! Tab-separated file source.

use super::{RawTable, TableSource};
use crate::prelude::*;
use async_trait::async_trait;
use datafusion::arrow::array::{Array, StringArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Field, Schema};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::prelude::{CsvReadOptions, SessionConfig, SessionContext};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncBufReadExt;
use tracing::{debug, info, instrument, warn};

/// Options for reading a TSV file.
#[derive(Debug, Clone)]
pub struct TsvOptions {
    /// Quote character (default: '"')
    pub quote: u8,
    /// Comment prefix (lines starting with this are ignored)
    pub comment: Option<u8>,
}

impl Default for TsvOptions {
    fn default() -> Self {
        Self {
            quote: b'"',
            comment: None,
        }
    }
}

/// A TSV file whose first line is the header.
///
/// Every column is read as text; typing happens later against the schema,
/// so a cell that fails to parse becomes a reported issue rather than a
/// load failure. Rows with fewer cells than the header keep their shorter
/// length in the loaded table.
#[derive(Debug, Clone)]
pub struct TsvSource {
    path: PathBuf,
    options: TsvOptions,
}

impl TsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            options: TsvOptions::default(),
        }
    }

    pub fn with_options(path: impl Into<PathBuf>, options: TsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn error(&self, message: impl std::fmt::Display) -> IngestError {
        IngestError::data_source("TSV", format!("{}: {message}", self.path.display()))
    }

    async fn read_header(&self) -> Result<Vec<String>> {
        let file = tokio::fs::File::open(&self.path).await.map_err(|e| {
            IngestError::data_source_with_source(
                "TSV",
                format!("Could not open {}", self.path.display()),
                Box::new(e),
            )
        })?;
        let mut lines = tokio::io::BufReader::new(file).lines();
        let line = lines
            .next_line()
            .await?
            .ok_or_else(|| self.error("header row is missing"))?;

        let header: Vec<String> = line
            .trim_end_matches('\r')
            .split('\t')
            .map(|name| name.trim_matches('"').to_string())
            .collect();

        let mut seen = HashSet::new();
        for name in &header {
            if name.is_empty() {
                return Err(self.error("header has an empty column name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(self.error(format!("column '{name}' appears more than once")));
            }
        }
        Ok(header)
    }
}

impl TsvSource {
    /// Truncated rows come back padded with nulls; cut them back to the
    /// number of cells the file actually had.
    async fn restore_short_rows(
        &self,
        records: &mut [Vec<Option<String>>],
        columns: usize,
    ) -> Result<()> {
        let text = tokio::fs::read_to_string(&self.path).await?;
        let widths = record_widths(&text, &self.options);
        let Some(data_widths) = widths.get(1..) else {
            return Ok(());
        };
        if data_widths.len() != records.len() {
            warn!(
                counted = data_widths.len(),
                loaded = records.len(),
                "Could not match rows to cell counts; short rows are padded"
            );
            return Ok(());
        }
        for (index, (record, &width)) in records.iter_mut().zip(data_widths).enumerate() {
            if width < columns {
                debug!(row = index + 2, cells = width, columns, "Short row");
                record.truncate(width);
            }
        }
        Ok(())
    }
}

/// Counts the cells of every non-empty record, header included. Tabs and
/// line breaks inside quotes do not split cells; comment lines are skipped.
fn record_widths(text: &str, options: &TsvOptions) -> Vec<usize> {
    let mut widths = Vec::new();
    let mut in_quotes = false;
    let mut cells = 1;
    let mut line_has_content = false;
    let mut in_comment = false;

    for &byte in text.as_bytes() {
        if in_comment {
            if byte == b'\n' {
                in_comment = false;
            }
            continue;
        }
        if !in_quotes && !line_has_content && Some(byte) == options.comment {
            in_comment = true;
            continue;
        }
        match byte {
            b if b == options.quote => {
                in_quotes = !in_quotes;
                line_has_content = true;
            }
            b'\t' if !in_quotes => {
                cells += 1;
                line_has_content = true;
            }
            b'\n' if !in_quotes => {
                if line_has_content {
                    widths.push(cells);
                }
                cells = 1;
                line_has_content = false;
            }
            b'\r' if !in_quotes => {}
            _ => line_has_content = true,
        }
    }
    if line_has_content {
        widths.push(cells);
    }
    widths
}

#[async_trait]
impl TableSource for TsvSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(source.type = "tsv", source.path = %self.path.display()))]
    async fn load(&self) -> Result<RawTable> {
        let header = self.read_header().await?;
        let schema = Schema::new(
            header
                .iter()
                .map(|name| Field::new(name, DataType::Utf8, true))
                .collect::<Vec<_>>(),
        );

        let path = self
            .path
            .to_str()
            .ok_or_else(|| self.error("path contains invalid UTF-8"))?;
        let extension = self
            .path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let mut options = CsvReadOptions::new()
            .has_header(true)
            .delimiter(b'\t')
            .quote(self.options.quote)
            .schema(&schema)
            .truncated_rows(true)
            .file_extension(&extension);
        if let Some(comment) = self.options.comment {
            options = options.comment(comment);
        }

        // One partition keeps batches in file order.
        let ctx = SessionContext::new_with_config(SessionConfig::new().with_target_partitions(1));
        let batches = ctx
            .read_csv(path, options)
            .await
            .map_err(|e| {
                IngestError::data_source_with_source("TSV", format!("Could not read {path}"), Box::new(e))
            })?
            .collect()
            .await
            .map_err(|e| {
                IngestError::data_source_with_source("TSV", format!("Could not parse {path}"), Box::new(e))
            })?;

        let mut records = Vec::new();
        for batch in &batches {
            records.extend(batch_records(batch)?);
        }
        self.restore_short_rows(&mut records, header.len()).await?;

        info!(columns = header.len(), rows = records.len(), "Loaded TSV file");
        Ok(RawTable {
            name: self.name(),
            header,
            records,
        })
    }
}

/// Converts a batch into per-row cell text. Empty cells become `None`.
fn batch_records(batch: &RecordBatch) -> Result<Vec<Vec<Option<String>>>> {
    let columns = batch
        .columns()
        .iter()
        .map(|column| cast(column, &DataType::Utf8))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let strings = columns
        .iter()
        .map(|column| {
            column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| IngestError::Internal("Expected a string column".to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(rows = batch.num_rows(), "Converting record batch");
    Ok((0..batch.num_rows())
        .map(|i| {
            strings
                .iter()
                .map(|array| {
                    (!array.is_null(i))
                        .then(|| array.value(i))
                        .filter(|text| !text.is_empty())
                        .map(str::to_string)
                })
                .collect()
        })
        .collect())
}
