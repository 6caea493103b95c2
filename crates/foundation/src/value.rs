//! Scalar values exchanged with the datastore.
//!
//! Every attribute of a [`Model`](crate::Model) and every column of a [`Row`](crate::Row)
//! holds a [`Value`]. Values render to SQL literals through [`Value::to_sql_literal`],
//! which is also the default quoting used by [`Connection::quote`](crate::Connection::quote).

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Datetime format used when storing chrono values as text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// Whether this is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render as an SQL literal.
    ///
    /// NULL is emitted verbatim, numbers bare, booleans as `1`/`0`, and text
    /// single-quoted with embedded quotes doubled. NaN and infinities have no
    /// SQL literal and render as NULL.
    pub fn to_sql_literal(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Float(f) if !f.is_finite() => "NULL".to_string(),
            Value::Bool(b) => if *b { "1" } else { "0" }.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Text(s) => quote_str(s),
        }
    }

    /// Compare two values the way loosely-typed form input expects:
    /// `Int(1)`, `Text("1")` and `Bool(true)` are all equal.
    ///
    /// NULL only equals NULL.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (Value::Text(a), Value::Text(b)) => a == b,
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => a.to_string() == b.to_string(),
            },
        }
    }

    /// Numeric view of the value, parsing text if needed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Null => None,
        }
    }

    /// Integer view of the value, parsing text if needed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Text view of the value (`None` for NULL).
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Whether the value is "empty" as an identifier: NULL, zero or blank text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Int(i) => *i == 0,
            Value::Float(f) => *f == 0.0,
            Value::Text(s) => s.is_empty() || s == "0",
        }
    }
}

/// Quote a string as an SQL text literal.
pub fn quote_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

impl fmt::Display for Value {
    /// Raw (unquoted) text of the value.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&String> for Value {
    fn from(v: &String) -> Self {
        Value::Text(v.clone())
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Text(v.format(DATETIME_FORMAT).to_string())
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Text(v.format("%Y-%m-%d").to_string())
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One key value or a list of key values, as accepted by finders,
/// `update` and `destroy`.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    One(Value),
    Many(Vec<Value>),
}

impl Lookup {
    /// Whether this lookup matches nothing (blank id or empty list).
    pub fn is_empty(&self) -> bool {
        match self {
            Lookup::One(v) => v.is_blank(),
            Lookup::Many(v) => v.is_empty(),
        }
    }

    /// Whether a list was given.
    pub fn is_many(&self) -> bool {
        matches!(self, Lookup::Many(_))
    }

    /// All values of the lookup.
    pub fn values(&self) -> &[Value] {
        match self {
            Lookup::One(v) => std::slice::from_ref(v),
            Lookup::Many(v) => v,
        }
    }
}

impl From<Value> for Lookup {
    fn from(v: Value) -> Self {
        Lookup::One(v)
    }
}

impl From<&Value> for Lookup {
    fn from(v: &Value) -> Self {
        Lookup::One(v.clone())
    }
}

impl From<Vec<Value>> for Lookup {
    fn from(v: Vec<Value>) -> Self {
        Lookup::Many(v)
    }
}

macro_rules! impl_lookup_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Lookup {
                fn from(v: $t) -> Self {
                    Lookup::One(v.into())
                }
            }

            impl From<Vec<$t>> for Lookup {
                fn from(v: Vec<$t>) -> Self {
                    Lookup::Many(v.into_iter().map(Into::into).collect())
                }
            }

            impl From<&[$t]> for Lookup {
                fn from(v: &[$t]) -> Self {
                    Lookup::Many(v.iter().cloned().map(Into::into).collect())
                }
            }
        )*
    };
}

impl_lookup_from!(i32, i64, u32, &str, String);
