//! Drives a validation pass over loaded tables.

use super::{
    IssueCode, Row, Schema, ValidationIssue, ValidationMetrics, ValidationReport,
    ValidationResult, Value,
};
use crate::cache::UrlStatusCache;
use crate::checks::make_checks;
use crate::config::ValidatorConfig;
use crate::prelude::*;
use crate::sources::RawTable;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument};

/// Validates tables against one schema.
///
/// For each table the validator checks the header, coerces every cell to its
/// field's declared type, enforces `required`, and then runs the custom
/// checks over the typed rows in file order. Each table gets fresh check
/// instances, so run-length state never carries from one table to the next.
///
/// # Examples
///
/// ```rust
/// use ingest_guard::config::ValidatorConfig;
/// use ingest_guard::core::{Schema, Validator};
/// use ingest_guard::sources::RawTable;
///
/// # fn example() -> ingest_guard::prelude::Result<()> {
/// let schema = Schema::from_yaml_str(
///     "fields:\n  - name: sample_id\n    custom_constraints:\n      sequence_limit: 2\n",
/// )?;
/// let validator = Validator::new(schema, ValidatorConfig::offline())?;
///
/// let table = RawTable::from_strings("metadata.tsv", ["sample_id"], [["S1"], ["S2"], ["S5"]]);
/// let result = validator.validate(&[table])?;
/// assert!(result.is_failure());
/// assert_eq!(result.report().issues[0].row, Some(3));
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Validator {
    name: String,
    schema: Schema,
    config: ValidatorConfig,
    cache: Option<Arc<UrlStatusCache>>,
}

impl Validator {
    /// Creates a validator. Unless the configuration is offline, URL checks
    /// go through an HTTP-backed cache at the configured path.
    ///
    /// Malformed custom constraints are reported here, before any table is read.
    /// Must not be called from inside an async runtime.
    pub fn new(schema: Schema, config: ValidatorConfig) -> Result<Self> {
        let cache = if config.is_offline() {
            None
        } else {
            let path = config.resolved_cache_path()?;
            Some(Arc::new(
                UrlStatusCache::with_http(path, config.http_timeout())?
                    .with_log_config(config.log_config().clone()),
            ))
        };
        Self::with_cache(schema, config, cache)
    }

    /// Creates a validator with an explicit URL cache; `None` disables URL checks.
    pub fn with_cache(
        schema: Schema,
        config: ValidatorConfig,
        cache: Option<Arc<UrlStatusCache>>,
    ) -> Result<Self> {
        let cache = if config.is_offline() { None } else { cache };
        make_checks(&schema, cache.clone())?;
        Ok(Self {
            name: "validation".to_string(),
            schema,
            config,
            cache,
        })
    }

    /// Sets the name recorded in reports.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validates every table in order and classifies the combined report.
    #[instrument(skip(self, tables), fields(validation.name = %self.name, tables = tables.len()))]
    pub fn validate(&self, tables: &[RawTable]) -> Result<ValidationResult> {
        let start = Instant::now();
        let mut report = ValidationReport::new(&self.name);
        let mut metrics = ValidationMetrics::default();

        for table in tables {
            let issues = self.validate_table(table)?;
            metrics.tables_validated += 1;
            metrics.rows_validated += table.records.len();
            report.issues.extend(issues);
        }

        metrics.execution_time_ms = start.elapsed().as_millis() as u64;
        report.metrics = metrics;
        info!(
            issues = report.issues.len(),
            rows = report.metrics.rows_validated,
            execution_time_ms = report.metrics.execution_time_ms,
            "Validation finished"
        );
        Ok(ValidationResult::from_report(report))
    }

    /// Validates one table, returning its issues in row order.
    #[instrument(skip(self, table), fields(table.name = %table.name, table.rows = table.records.len()))]
    pub fn validate_table(&self, table: &RawTable) -> Result<Vec<ValidationIssue>> {
        let log = self.config.log_config();
        let mut issues = self.header_issues(table);
        crate::log_table_op!(
            log,
            header_issues = issues.len(),
            columns = table.header.len(),
            "Checked table header"
        );

        let mut checks = make_checks(&self.schema, self.cache.clone())?;
        for (index, record) in table.records.iter().enumerate() {
            let row_issues_before = issues.len();
            let row = self.typed_row(table, index + 2, record, &mut issues);
            for check in checks.iter_mut() {
                let name = check.name().to_string();
                issues.extend(
                    check
                        .check(&row)?
                        .into_iter()
                        .map(|error| ValidationIssue::from_cell_error(&table.name, &name, error)),
                );
            }
            crate::log_row!(
                log,
                row = row.number(),
                issues = issues.len() - row_issues_before,
                "Checked row"
            );
        }
        Ok(issues)
    }

    fn header_issues(&self, table: &RawTable) -> Vec<ValidationIssue> {
        let mut issues: Vec<ValidationIssue> = self
            .schema
            .field_names()
            .filter(|name| !table.header.iter().any(|column| column == name))
            .filter(|name| !self.config.is_optional(name))
            .map(|name| {
                ValidationIssue::header(
                    IssueCode::MissingLabel,
                    &table.name,
                    name,
                    "Column is missing from the header",
                )
            })
            .collect();
        issues.extend(
            table
                .header
                .iter()
                .filter(|column| self.schema.field(column).is_none())
                .map(|column| {
                    ValidationIssue::header(
                        IssueCode::ExtraLabel,
                        &table.name,
                        column,
                        "Column is not defined in the schema",
                    )
                }),
        );
        issues
    }

    /// Types one record; structural, coercion and `required` failures are
    /// pushed to `issues`. Cells missing from a short record are null.
    fn typed_row(
        &self,
        table: &RawTable,
        number: usize,
        record: &[Option<String>],
        issues: &mut Vec<ValidationIssue>,
    ) -> Row {
        if record.len() > table.header.len() {
            issues.push(ValidationIssue::row(
                IssueCode::ExtraCell,
                &table.name,
                number,
                format!(
                    "Row has {} cells but the header has {}",
                    record.len(),
                    table.header.len()
                ),
            ));
        }
        for column in table.header.iter().skip(record.len()) {
            issues.push(ValidationIssue::cell(
                IssueCode::MissingCell,
                &table.name,
                number,
                column,
                "Row has no cell for this column",
            ));
        }

        let mut row = Row::new(number);
        for (column, cell) in table.header.iter().zip(record) {
            let field = self.schema.field(column);
            let value = match (cell, field) {
                (None, Some(field)) if field.constraints.required => {
                    issues.push(ValidationIssue::cell(
                        IssueCode::RequiredField,
                        &table.name,
                        number,
                        column,
                        "Field is required but the cell is empty",
                    ));
                    Value::Null
                }
                (None, _) => Value::Null,
                (Some(text), Some(field)) => field.field_type.coerce(text).unwrap_or_else(|message| {
                    issues.push(ValidationIssue::cell(
                        IssueCode::TypeError,
                        &table.name,
                        number,
                        column,
                        message,
                    ));
                    Value::Null
                }),
                (Some(text), None) => Value::String(text.clone()),
            };
            row.insert(column.clone(), value);
        }
        for column in table.header.iter().skip(record.len()) {
            row.insert(column.clone(), Value::Null);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldDescriptor, FieldType};
    use crate::test_helpers::RecordingFetcher;
    use serde_json::json;

    fn offline(schema: Schema) -> Validator {
        Validator::new(schema, ValidatorConfig::offline()).unwrap()
    }

    #[test]
    fn test_header_missing_and_extra() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("a"),
            FieldDescriptor::new("b"),
            FieldDescriptor::new("c"),
        ])
        .unwrap();
        let validator = Validator::with_cache(
            schema,
            ValidatorConfig::offline().with_optional_fields(["c"]),
            None,
        )
        .unwrap();

        let table = RawTable::from_strings("t.tsv", ["a", "x"], [["1", "2"]]);
        let issues = validator.validate_table(&table).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, IssueCode::MissingLabel);
        assert_eq!(issues[0].field.as_deref(), Some("b"));
        assert_eq!(issues[1].code, IssueCode::ExtraLabel);
        assert_eq!(issues[1].field.as_deref(), Some("x"));
    }

    #[test]
    fn test_type_and_required_errors() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("id").required(),
            FieldDescriptor::new("count").with_type(FieldType::Integer),
        ])
        .unwrap();
        let table = RawTable::from_strings("t.tsv", ["id", "count"], [["", "3"], ["x", "three"]]);
        let issues = offline(schema).validate_table(&table).unwrap();

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, IssueCode::RequiredField);
        assert_eq!(issues[0].row, Some(2));
        assert_eq!(issues[1].code, IssueCode::TypeError);
        assert_eq!(issues[1].row, Some(3));
        assert_eq!(issues[1].field.as_deref(), Some("count"));
    }

    #[test]
    fn test_units_use_typed_zero() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("thickness").with_type(FieldType::Number),
            FieldDescriptor::new("unit").with_custom_constraint("units_for", json!("thickness")),
        ])
        .unwrap();
        let table = RawTable::from_strings("t.tsv", ["thickness", "unit"], [["0", ""], ["", ""]]);
        let issues = offline(schema).validate_table(&table).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::CustomConstraint);
        assert_eq!(issues[0].check.as_deref(), Some("units_for"));
        assert_eq!(issues[0].message, "Required when thickness is filled");
    }

    #[test]
    fn test_sequence_state_resets_per_table() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("id").with_custom_constraint("sequence_limit", json!(3))
        ])
        .unwrap();
        let validator = offline(schema);
        let first = RawTable::from_strings("a.tsv", ["id"], [["A1"], ["A2"]]);
        let second = RawTable::from_strings("b.tsv", ["id"], [["A3"], ["A4"]]);
        let result = validator.validate(&[first, second]).unwrap();
        assert!(result.is_success());
        assert_eq!(result.report().metrics.tables_validated, 2);
        assert_eq!(result.report().metrics.rows_validated, 4);
    }

    #[test]
    fn test_url_check_uses_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::always(404).with_response("https://doi.org/ok", 200);
        let cache = Arc::new(UrlStatusCache::new(
            dir.path().join("cache.json"),
            Box::new(fetcher.clone()),
        ));
        let schema = Schema::new(vec![FieldDescriptor::new("doi")
            .with_custom_constraint("url", json!({"prefix": "https://doi.org/"}))])
        .unwrap();
        let validator = Validator::with_cache(schema, ValidatorConfig::new(), Some(cache)).unwrap();

        let table = RawTable::from_strings("t.tsv", ["doi"], [["ok"], ["bad"], ["bad"], [""]]);
        let issues = validator.validate_table(&table).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].message, "URL returned 404: \"https://doi.org/bad\"");
        assert_eq!(fetcher.calls(), 2);
    }

    #[test]
    fn test_offline_config_ignores_supplied_cache() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::always(404);
        let cache = Arc::new(UrlStatusCache::new(
            dir.path().join("cache.json"),
            Box::new(fetcher.clone()),
        ));
        let schema = Schema::new(vec![FieldDescriptor::new("doi")
            .with_custom_constraint("url", json!({"prefix": "https://doi.org/"}))])
        .unwrap();
        let validator =
            Validator::with_cache(schema, ValidatorConfig::offline(), Some(cache)).unwrap();
        let table = RawTable::from_strings("t.tsv", ["doi"], [["bad"]]);
        assert!(validator.validate_table(&table).unwrap().is_empty());
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_bad_constraint_fails_at_construction() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("id").with_custom_constraint("sequence_limit", json!("three"))
        ])
        .unwrap();
        let err = Validator::new(schema, ValidatorConfig::offline()).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn test_short_record_reports_missing_cells() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("a"),
            FieldDescriptor::new("b").required(),
            FieldDescriptor::new("c").with_custom_constraint("forbid_na", json!(true)),
        ])
        .unwrap();
        let table = RawTable {
            name: "t.tsv".to_string(),
            header: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            records: vec![
                vec![Some("1".to_string()), Some("2".to_string()), Some("3".to_string())],
                vec![Some("4".to_string())],
                vec![Some("7".to_string()), Some("8".to_string()), Some("NA".to_string())],
            ],
        };
        let issues = offline(schema).validate_table(&table).unwrap();

        assert_eq!(issues.len(), 3);
        assert_eq!(issues[0].code, IssueCode::MissingCell);
        assert_eq!((issues[0].row, issues[0].field.as_deref()), (Some(3), Some("b")));
        assert_eq!(issues[1].code, IssueCode::MissingCell);
        assert_eq!(issues[1].field.as_deref(), Some("c"));
        assert_eq!(issues[2].code, IssueCode::CustomConstraint);
        assert_eq!(issues[2].row, Some(4));
    }

    #[test]
    fn test_long_record_reports_extra_cells() {
        let schema = Schema::new(vec![FieldDescriptor::new("a")]).unwrap();
        let table = RawTable {
            name: "t.tsv".to_string(),
            header: vec!["a".to_string()],
            records: vec![vec![Some("1".to_string()), Some("2".to_string())]],
        };
        let issues = offline(schema).validate_table(&table).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, IssueCode::ExtraCell);
        assert_eq!(issues[0].field, None);
    }

    #[test]
    fn test_number_cells_keep_source_text() {
        let schema = Schema::new(vec![FieldDescriptor::new("version")
            .with_type(FieldType::Number)
            .with_custom_constraint("sequence_limit", json!(2))])
        .unwrap();
        let table = RawTable::from_strings("t.tsv", ["version"], [["1.10"], ["1.11"]]);
        let issues = offline(schema).validate_table(&table).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].row, Some(3));
    }
}
