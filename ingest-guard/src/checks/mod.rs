//! Custom constraint checks built from a schema's `custom_constraints`.
//!
//! [`CheckFactory`] reads the per-field declarations once and builds one
//! [`RowCheck`](crate::core::RowCheck) per constraint kind:
//!
//! | kind             | parameters                          | check                   |
//! |------------------|-------------------------------------|-------------------------|
//! | `url`            | `{prefix: "https://..."}`           | [`UrlCheck`]            |
//! | `sequence_limit` | `3` or `{limit: 3}`                 | [`SequenceLimitCheck`]  |
//! | `units_for`      | `other_field` or `{field_name: ..}` | [`UnitsCheck`]          |
//! | `forbid_na`      | `true`                              | [`ForbidNaCheck`]       |
//!
//! Kinds a check does not know are ignored. A field may declare several kinds.
//!
//! ## Example
//!
//! ```rust
//! use ingest_guard::checks::make_checks;
//! use ingest_guard::core::{Row, RowCheck, Schema};
//!
//! # fn example() -> ingest_guard::prelude::Result<()> {
//! let schema = Schema::from_yaml_str(
//!     r#"
//! fields:
//!   - name: sample_id
//!     custom_constraints:
//!       sequence_limit: 2
//! "#,
//! )?;
//!
//! // No URL cache: the network check is left out.
//! let mut checks = make_checks(&schema, None)?;
//!
//! let mut notes = Vec::new();
//! for (i, id) in ["S1", "S2", "S5"].into_iter().enumerate() {
//!     let row = Row::new(i + 2).with_cell("sample_id", id);
//!     for check in checks.iter_mut() {
//!         notes.extend(check.check(&row)?);
//!     }
//! }
//! assert_eq!(notes.len(), 1);
//! assert_eq!(notes[0].row, 3);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod forbid_na;
mod sequence;
mod units;
mod url;

pub use forbid_na::ForbidNaCheck;
pub use sequence::SequenceLimitCheck;
pub use units::UnitsCheck;
pub use url::UrlCheck;

use crate::cache::UrlStatusCache;
use crate::core::{BoxedRowCheck, Schema};
use crate::prelude::*;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Constraint kind names as written in schemas.
pub mod kinds {
    pub const URL: &str = "url";
    pub const SEQUENCE_LIMIT: &str = "sequence_limit";
    pub const UNITS_FOR: &str = "units_for";
    pub const FORBID_NA: &str = "forbid_na";
}

/// Parameters of a `url` constraint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UrlParams {
    /// Prepended to the cell value to form the URL
    pub prefix: String,
}

/// Parameters of a `sequence_limit` constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SequenceLimitParams {
    Bare(i64),
    Table { limit: i64 },
}

impl SequenceLimitParams {
    pub fn limit(&self) -> i64 {
        match self {
            SequenceLimitParams::Bare(limit) | SequenceLimitParams::Table { limit } => *limit,
        }
    }
}

/// Parameters of a `units_for` constraint: the controlling field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UnitsForParams {
    Bare(String),
    Table { field_name: String },
}

impl UnitsForParams {
    pub fn field_name(&self) -> &str {
        match self {
            UnitsForParams::Bare(name) | UnitsForParams::Table { field_name: name } => name,
        }
    }
}

/// Builds checks from one schema.
#[derive(Debug, Clone, Copy)]
pub struct CheckFactory<'a> {
    schema: &'a Schema,
}

impl<'a> CheckFactory<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Returns field name -> raw parameters for every field declaring `kind`.
    ///
    /// Fields without custom constraints, or without this kind, are left out.
    pub fn raw_constrained_fields(&self, kind: &str) -> BTreeMap<String, &'a serde_json::Value> {
        self.schema
            .fields
            .iter()
            .filter_map(|field| {
                field
                    .custom_constraint(kind)
                    .map(|params| (field.name.clone(), params))
            })
            .collect()
    }

    /// Like [`raw_constrained_fields`](Self::raw_constrained_fields), with the
    /// parameters decoded into `T`.
    pub fn constrained_fields<T: DeserializeOwned>(&self, kind: &str) -> Result<BTreeMap<String, T>> {
        self.raw_constrained_fields(kind)
            .into_iter()
            .map(|(name, params)| {
                let decoded = T::deserialize(params).map_err(|e| {
                    IngestError::Configuration(format!(
                        "field '{name}': invalid '{kind}' constraint {params}: {e}"
                    ))
                })?;
                Ok((name, decoded))
            })
            .collect()
    }

    pub fn make_url_check(&self, cache: Arc<UrlStatusCache>) -> Result<UrlCheck> {
        let fields = self.constrained_fields::<UrlParams>(kinds::URL)?;
        Ok(UrlCheck::new(
            fields.into_iter().map(|(name, p)| (name, p.prefix)).collect(),
            cache,
        ))
    }

    pub fn make_sequence_limit_check(&self) -> Result<SequenceLimitCheck> {
        let fields = self.constrained_fields::<SequenceLimitParams>(kinds::SEQUENCE_LIMIT)?;
        SequenceLimitCheck::new(fields.into_iter().map(|(name, p)| (name, p.limit())).collect())
    }

    pub fn make_units_check(&self) -> Result<UnitsCheck> {
        let fields = self.constrained_fields::<UnitsForParams>(kinds::UNITS_FOR)?;
        Ok(UnitsCheck::new(
            fields
                .into_iter()
                .map(|(name, p)| (name, p.field_name().to_string()))
                .collect(),
        ))
    }

    pub fn make_forbid_na_check(&self) -> Result<ForbidNaCheck> {
        let fields = self.constrained_fields::<bool>(kinds::FORBID_NA)?;
        Ok(ForbidNaCheck::new(
            fields
                .into_iter()
                .filter_map(|(name, enabled)| enabled.then_some(name))
                .collect(),
        ))
    }
}

/// Builds the custom checks for one validation pass, in a fixed order:
/// URL, sequence limit, units, forbid NA.
///
/// Passing `None` for `cache` leaves the URL check out (offline mode).
#[instrument(skip(schema, cache), fields(schema.fields = schema.fields.len(), offline = cache.is_none()))]
pub fn make_checks(
    schema: &Schema,
    cache: Option<Arc<UrlStatusCache>>,
) -> Result<Vec<BoxedRowCheck>> {
    let factory = CheckFactory::new(schema);
    let mut checks: Vec<BoxedRowCheck> = Vec::with_capacity(4);
    if let Some(cache) = cache {
        checks.push(Box::new(factory.make_url_check(cache)?));
    }
    checks.push(Box::new(factory.make_sequence_limit_check()?));
    checks.push(Box::new(factory.make_units_check()?));
    checks.push(Box::new(factory.make_forbid_na_check()?));
    debug!(checks = checks.len(), "Built custom checks");
    Ok(checks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldDescriptor, Row, RowCheck};
    use crate::test_helpers::RecordingFetcher;
    use serde_json::json;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldDescriptor::new("plain"),
            FieldDescriptor::new("doi").with_custom_constraint("url", json!({"prefix": "https://doi.org/"})),
            FieldDescriptor::new("id").with_custom_constraint("sequence_limit", json!(3)),
            FieldDescriptor::new("id2").with_custom_constraint("sequence_limit", json!({"limit": 4})),
            FieldDescriptor::new("unit")
                .with_custom_constraint("units_for", json!("value"))
                .with_custom_constraint("forbid_na", json!(true))
                .with_custom_constraint("not_a_real_kind", json!({"x": 1})),
            FieldDescriptor::new("value"),
        ])
        .unwrap()
    }

    #[test]
    fn test_constrained_fields_groups_by_kind() {
        let schema = schema();
        let factory = CheckFactory::new(&schema);

        let urls = factory.constrained_fields::<UrlParams>("url").unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls["doi"].prefix, "https://doi.org/");

        let limits = factory
            .constrained_fields::<SequenceLimitParams>("sequence_limit")
            .unwrap();
        assert_eq!(limits["id"].limit(), 3);
        assert_eq!(limits["id2"].limit(), 4);

        let units = factory.constrained_fields::<UnitsForParams>("units_for").unwrap();
        assert_eq!(units["unit"].field_name(), "value");

        assert!(factory.raw_constrained_fields("missing_kind").is_empty());
        assert_eq!(factory.raw_constrained_fields("not_a_real_kind").len(), 1);
    }

    #[test]
    fn test_units_for_table_form() {
        let schema = Schema::new(vec![FieldDescriptor::new("u")
            .with_custom_constraint("units_for", json!({"field_name": "v"}))])
        .unwrap();
        let units = CheckFactory::new(&schema)
            .constrained_fields::<UnitsForParams>("units_for")
            .unwrap();
        assert_eq!(units["u"].field_name(), "v");
    }

    #[test]
    fn test_malformed_params_are_configuration_errors() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("doi").with_custom_constraint("url", json!("https://no-prefix-key/"))
        ])
        .unwrap();
        let err = CheckFactory::new(&schema)
            .make_url_check(Arc::new(UrlStatusCache::new(
                "unused.json",
                Box::new(RecordingFetcher::always(200)),
            )))
            .unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
        assert!(err.to_string().contains("field 'doi'"));
    }

    #[test]
    fn test_sequence_limit_must_exceed_one() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("id").with_custom_constraint("sequence_limit", json!(1))
        ])
        .unwrap();
        let err = make_checks(&schema, None).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn test_make_checks_order_and_offline() {
        let schema = schema();
        let offline = make_checks(&schema, None).unwrap();
        let names: Vec<_> = offline.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["sequence_limit", "units_for", "forbid_na"]);

        let dir = tempfile::tempdir().unwrap();
        let cache = Arc::new(UrlStatusCache::new(
            dir.path().join("cache.json"),
            Box::new(RecordingFetcher::always(200)),
        ));
        let online = make_checks(&schema, Some(cache)).unwrap();
        assert_eq!(online.len(), 4);
        assert_eq!(online[0].name(), "url");
    }

    #[test]
    fn test_no_custom_constraints_is_vacuous() {
        let schema = Schema::new(vec![FieldDescriptor::new("a"), FieldDescriptor::new("b")]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::always(404);
        let cache = Arc::new(UrlStatusCache::new(
            dir.path().join("cache.json"),
            Box::new(fetcher.clone()),
        ));
        let mut checks = make_checks(&schema, Some(cache)).unwrap();

        for (i, (a, b)) in [("NA", "x1"), ("x2", "N/A"), ("x3", "")].into_iter().enumerate() {
            let row = Row::new(i + 2).with_cell("a", a).with_cell("b", b);
            for check in checks.iter_mut() {
                assert!(check.check(&row).unwrap().is_empty());
            }
        }
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_forbid_na_false_disables() {
        let schema = Schema::new(vec![
            FieldDescriptor::new("x").with_custom_constraint("forbid_na", json!(false))
        ])
        .unwrap();
        let mut check = CheckFactory::new(&schema).make_forbid_na_check().unwrap();
        let row = Row::new(2).with_cell("x", "NA");
        assert!(check.check(&row).unwrap().is_empty());
    }
}
