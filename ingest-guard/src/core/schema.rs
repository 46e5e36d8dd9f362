//! Table schemas: ordered field descriptors with structural and custom constraints.
//!
//! Schemas are written in YAML (or JSON) in the shape below. Only the
//! `custom_constraints` map drives the checks in [`crate::checks`]; `type` and
//! `constraints.required` are enforced by the [`Validator`](super::Validator).
//!
//! ```yaml
//! fields:
//!   - name: sample_id
//!     custom_constraints:
//!       sequence_limit: 3
//!   - name: protocols_io_doi
//!     custom_constraints:
//!       url:
//!         prefix: "https://dx.doi.org/"
//!   - name: section_thickness_value
//!     type: number
//!   - name: section_thickness_unit
//!     custom_constraints:
//!       units_for: section_thickness_value
//! ```

use super::{Number, Value};
use crate::prelude::*;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// Declared type of a field. Cells are coerced to this type when a table is
/// validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Date,
    Datetime,
    /// Accepts any text unchanged.
    Any,
}

impl FieldType {
    /// Coerces raw cell text into a typed value. Empty text is always null.
    pub fn coerce(&self, raw: &str) -> std::result::Result<Value, String> {
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        match self {
            FieldType::String | FieldType::Any => Ok(Value::String(raw.to_string())),
            FieldType::Integer => raw
                .trim()
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| format!("type is \"integer\", but \"{raw}\" is not an integer")),
            FieldType::Number => Number::parse(raw.trim())
                .map(Value::Number)
                .ok_or_else(|| format!("type is \"number\", but \"{raw}\" is not a number")),
            FieldType::Boolean => match raw.trim() {
                "true" | "True" | "TRUE" | "1" => Ok(Value::Boolean(true)),
                "false" | "False" | "FALSE" | "0" => Ok(Value::Boolean(false)),
                _ => Err(format!("type is \"boolean\", but \"{raw}\" is not a boolean")),
            },
            FieldType::Date => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| format!("type is \"date\", but \"{raw}\" is not a YYYY-MM-DD date")),
            FieldType::Datetime => parse_datetime(raw.trim()).map(Value::DateTime).ok_or_else(|| {
                format!("type is \"datetime\", but \"{raw}\" is not an ISO 8601 datetime")
            }),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Structural constraints on a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraints {
    /// The cell must not be empty.
    #[serde(default)]
    pub required: bool,
}

/// A single field of a schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Unique field name, matched against the TSV header
    pub name: String,
    /// Declared type of the field's cells
    #[serde(default, rename = "type")]
    pub field_type: FieldType,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structural constraints
    #[serde(default)]
    pub constraints: FieldConstraints,
    /// Custom constraint kind -> parameters, e.g. `url: {prefix: ...}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_constraints: Option<BTreeMap<String, serde_json::Value>>,
}

impl FieldDescriptor {
    /// Creates a string field with no constraints.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: FieldType::default(),
            description: None,
            constraints: FieldConstraints::default(),
            custom_constraints: None,
        }
    }

    /// Sets the declared type.
    pub fn with_type(mut self, field_type: FieldType) -> Self {
        self.field_type = field_type;
        self
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.constraints.required = true;
        self
    }

    /// Adds a custom constraint declaration.
    pub fn with_custom_constraint(
        mut self,
        kind: impl Into<String>,
        params: serde_json::Value,
    ) -> Self {
        self.custom_constraints
            .get_or_insert_with(BTreeMap::new)
            .insert(kind.into(), params);
        self
    }

    /// Returns the parameters of a custom constraint kind, if declared.
    pub fn custom_constraint(&self, kind: &str) -> Option<&serde_json::Value> {
        self.custom_constraints.as_ref()?.get(kind)
    }
}

/// An ordered collection of field descriptors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<FieldDescriptor>,
}

impl Schema {
    /// Creates a schema from field descriptors, rejecting duplicate names.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let schema = Self { fields };
        schema.ensure_unique_names()?;
        Ok(schema)
    }

    /// Parses a YAML schema document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let schema: Schema =
            serde_yaml::from_str(text).map_err(|e| IngestError::Schema(e.to_string()))?;
        schema.ensure_unique_names()?;
        Ok(schema)
    }

    /// Parses a JSON schema document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let schema: Schema =
            serde_json::from_str(text).map_err(|e| IngestError::Schema(e.to_string()))?;
        schema.ensure_unique_names()?;
        Ok(schema)
    }

    /// Loads a schema file; `.json` files are parsed as JSON, anything else as YAML.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Reading schema {}", path.display()))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };
        parsed.with_context(|| format!("Parsing schema {}", path.display()))
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn ensure_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(IngestError::Schema(format!(
                    "field '{}' is declared more than once",
                    field.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SCHEMA_YAML: &str = r#"
fields:
  - name: sample_id
    constraints:
      required: true
    custom_constraints:
      sequence_limit: 3
  - name: protocols_io_doi
    custom_constraints:
      url:
        prefix: "https://dx.doi.org/"
  - name: thickness
    type: number
  - name: thickness_unit
    custom_constraints:
      units_for: thickness
"#;

    #[test]
    fn test_parse_yaml() {
        let schema = Schema::from_yaml_str(SCHEMA_YAML).unwrap();
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["sample_id", "protocols_io_doi", "thickness", "thickness_unit"]
        );
        let sample = schema.field("sample_id").unwrap();
        assert!(sample.constraints.required);
        assert_eq!(sample.custom_constraint("sequence_limit"), Some(&json!(3)));
        assert_eq!(schema.field("thickness").unwrap().field_type, FieldType::Number);
        assert_eq!(
            schema
                .field("protocols_io_doi")
                .unwrap()
                .custom_constraint("url"),
            Some(&json!({"prefix": "https://dx.doi.org/"}))
        );
    }

    #[test]
    fn test_duplicate_fields_rejected() {
        let err = Schema::from_yaml_str("fields: [{name: a}, {name: a}]").unwrap_err();
        assert!(matches!(err, IngestError::Schema(_)));
        assert!(Schema::new(vec![FieldDescriptor::new("a"), FieldDescriptor::new("a")]).is_err());
    }

    #[test]
    fn test_json_schema() {
        let schema = Schema::from_json_str(
            r#"{"fields": [{"name": "x", "type": "integer", "custom_constraints": {"forbid_na": true}}]}"#,
        )
        .unwrap();
        let x = schema.field("x").unwrap();
        assert_eq!(x.field_type, FieldType::Integer);
        assert_eq!(x.custom_constraint("forbid_na"), Some(&json!(true)));
    }

    #[test]
    fn test_coerce_types() {
        assert_eq!(FieldType::Integer.coerce("12"), Ok(Value::Integer(12)));
        assert!(FieldType::Integer.coerce("1.5").is_err());
        assert_eq!(FieldType::Number.coerce("0"), Ok(Value::from(0.0)));
        assert_eq!(FieldType::Number.coerce("1.10").unwrap().to_string(), "1.10");
        assert_eq!(FieldType::Boolean.coerce("False"), Ok(Value::Boolean(false)));
        assert_eq!(FieldType::String.coerce(""), Ok(Value::Null));
        assert!(matches!(
            FieldType::Date.coerce("2020-02-29"),
            Ok(Value::Date(_))
        ));
        assert!(FieldType::Date.coerce("2020-02-30").is_err());
        assert!(matches!(
            FieldType::Datetime.coerce("2020-01-01T10:00:00Z"),
            Ok(Value::DateTime(_))
        ));
        assert!(matches!(
            FieldType::Datetime.coerce("2020-01-01 10:00:00"),
            Ok(Value::DateTime(_))
        ));
    }

    #[test]
    fn test_from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("schema.yaml");
        std::fs::write(&yaml_path, SCHEMA_YAML).unwrap();
        assert_eq!(Schema::from_path(&yaml_path).unwrap().fields.len(), 4);

        let json_path = dir.path().join("schema.json");
        std::fs::write(&json_path, r#"{"fields": [{"name": "only"}]}"#).unwrap();
        assert_eq!(Schema::from_path(&json_path).unwrap().fields.len(), 1);

        let missing = Schema::from_path(dir.path().join("nope.yaml")).unwrap_err();
        assert!(missing.is_user_error());
    }
}
