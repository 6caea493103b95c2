//! Row mapping traits and utilities

use crate::error::{OrmError, OrmResult};
use crate::value::{DATETIME_FORMAT, Value};
use chrono::{NaiveDate, NaiveDateTime};

/// A single result row: ordered `column -> value` pairs.
///
/// Column lookup is case-insensitive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column. A column with the same name is replaced in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.position(&column) {
            Some(idx) => self.columns[idx].1 = value,
            None => self.columns.push((column, value)),
        }
    }

    /// Builder-style [`Row::push`].
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Get a column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.position(column).map(|idx| &self.columns[idx].1)
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Whether the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(c, _)| c.as_str())
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(c, v)| (c.as_str(), v))
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|(c, _)| c.eq_ignore_ascii_case(column))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (k, v) in iter {
            row.push(k, v);
        }
        row
    }
}

/// The rows returned by a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    rows: Vec<Row>,
}

impl RowSet {
    /// Wrap already-fetched rows.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows in the set.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Whether the set has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Borrow the rows.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Take all rows.
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }
}

impl From<Vec<Row>> for RowSet {
    fn from(rows: Vec<Row>) -> Self {
        Self::new(rows)
    }
}

/// Conversion from a [`Value`] into a Rust type.
pub trait FromValue: Sized {
    /// Convert, or return a description of why the value does not fit.
    fn from_value(value: &Value) -> Result<Self, String>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_i64()
            .ok_or_else(|| format!("expected integer, got {value:?}"))
    }
}

impl FromValue for i32 {
    fn from_value(value: &Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|e| e.to_string())
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, String> {
        value
            .as_f64()
            .ok_or_else(|| format!("expected number, got {value:?}"))
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::Null => Err("expected boolean, got NULL".to_string()),
            other => other
                .as_i64()
                .map(|i| i != 0)
                .ok_or_else(|| format!("expected boolean, got {other:?}")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Err("expected text, got NULL".to_string()),
            other => Ok(other.to_string()),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: &Value) -> Result<Self, String> {
        let s = String::from_value(value)?;
        NaiveDateTime::parse_from_str(&s, DATETIME_FORMAT).map_err(|e| e.to_string())
    }
}

impl FromValue for NaiveDate {
    fn from_value(value: &Value) -> Result<Self, String> {
        let s = String::from_value(value)?;
        NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|e| e.to_string())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Trait for types that can be constructed from a result row.
pub trait FromRow: Sized {
    /// Construct an instance from a row.
    fn from_row(row: &Row) -> OrmResult<Self>;
}

impl FromRow for Row {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(row.clone())
    }
}

/// Extension trait for typed column access.
pub trait RowExt {
    /// Get a typed column value; a missing column is a decode error.
    fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T>;
}

impl RowExt for Row {
    fn try_get<T: FromValue>(&self, column: &str) -> OrmResult<T> {
        match self.get(column) {
            Some(value) => T::from_value(value).map_err(|e| OrmError::decode(column, e)),
            // Absent columns decode like NULL, so `Option<T>` fields may be omitted.
            None => T::from_value(&Value::Null)
                .map_err(|_| OrmError::decode(column, "column not present in row")),
        }
    }
}
