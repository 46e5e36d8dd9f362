//! Ordered, typed rows handed to each check.

use super::Value;

/// One data row of a table.
///
/// Cells keep the column order of the source. A field that is not a column
/// of the table is absent (`get` returns `None`), which is different from a
/// column whose cell is empty (`get` returns `Some(&Value::Null)`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    number: usize,
    cells: Vec<(String, Value)>,
}

impl Row {
    /// Creates an empty row with the given 1-based position in the source.
    ///
    /// The header is row 1, so the first data row is row 2.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            cells: Vec::new(),
        }
    }

    /// Creates a row from `(field, value)` pairs.
    pub fn from_pairs<I, K, V>(number: usize, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut row = Self::new(number);
        for (name, value) in pairs {
            row.insert(name, value);
        }
        row
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_cell(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Sets a cell, replacing the value in place if the field already exists.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.cells.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((name, value)),
        }
    }

    /// Returns the value of a field, or `None` if the field is absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    /// Returns true if the row has a cell for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates cells in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.cells.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// The row's 1-based position in the source.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
