//! Typed cell values.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;

/// A parsed number that remembers the text it was read from.
///
/// `1.10` stays `1.10` when printed, so URLs and sequence suffixes built from
/// number cells match the submitted text.
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    value: f64,
    text: String,
}

impl Number {
    /// Parses decimal text, keeping it verbatim for display.
    pub fn parse(text: &str) -> Option<Self> {
        let value = text.parse::<f64>().ok()?;
        Some(Self {
            value,
            text: text.to_string(),
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Self {
            value,
            text: value.to_string(),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.value)
    }
}

/// A single cell value after schema type coercion.
///
/// Empty TSV cells are always [`Value::Null`]; an empty [`Value::String`] only
/// appears when rows are built by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// Free text
    String(String),
    /// Whole number
    Integer(i64),
    /// Decimal number
    Number(Number),
    /// Boolean flag
    Boolean(bool),
    /// Calendar date
    Date(NaiveDate),
    /// Date and time without zone
    DateTime(NaiveDateTime),
}

impl Value {
    /// Returns true if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the inner text for string values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Truthiness used by the units check for the constrained field itself:
    /// null, the empty string, numeric zero and `false` are all "empty".
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            Value::Integer(i) => *i != 0,
            Value::Number(n) => n.value() != 0.0,
            Value::Boolean(b) => *b,
            Value::Date(_) | Value::DateTime(_) => true,
        }
    }

    /// Whether a controlling field counts as filled in. Unlike
    /// [`is_truthy`](Self::is_truthy), numeric zero and `false` are filled.
    pub fn is_filled(&self) -> bool {
        match self {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::String(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value.into())
    }
}

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
