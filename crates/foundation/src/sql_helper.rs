//! Builders for simple INSERT / UPDATE / DELETE statements.
//!
//! Values are spliced into the SQL text as literals quoted by the
//! [`Connection`]; there are no bound parameters. `NULL` is never quoted.

use crate::client::Connection;
use crate::value::Value;

/// Data for a SET clause: either column/value pairs or pre-rendered SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum SetData {
    /// Rendered as-is after the SET keyword.
    Raw(String),
    /// `COLUMN = value` pairs, in order.
    Fields(Vec<(String, Value)>),
}

impl SetData {
    /// Whether there is nothing to set.
    pub fn is_empty(&self) -> bool {
        match self {
            SetData::Raw(sql) => sql.trim().is_empty(),
            SetData::Fields(fields) => fields.is_empty(),
        }
    }
}

impl From<&str> for SetData {
    fn from(sql: &str) -> Self {
        SetData::Raw(sql.to_string())
    }
}

impl From<String> for SetData {
    fn from(sql: String) -> Self {
        SetData::Raw(sql)
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for SetData {
    fn from(fields: Vec<(K, V)>) -> Self {
        SetData::Fields(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Statement builders bound to a connection's quoting rules.
#[derive(Clone, Copy)]
pub struct SqlHelper<'a> {
    conn: &'a dyn Connection,
}

impl<'a> SqlHelper<'a> {
    pub fn new(conn: &'a dyn Connection) -> Self {
        Self { conn }
    }

    /// `UPDATE table SET ... WHERE where_sql`
    pub fn build_update(
        &self,
        table: &str,
        data: impl Into<SetData>,
        where_sql: &str,
        auto_quote: bool,
    ) -> String {
        let set = self.build_set(data, auto_quote);
        format!("UPDATE {table} {set} WHERE {where_sql}")
    }

    /// `DELETE FROM table WHERE where_sql [LIMIT n]`; a zero limit adds nothing.
    pub fn build_delete(&self, table: &str, where_sql: &str, limit: u64) -> String {
        let mut sql = format!("DELETE FROM {table} WHERE {where_sql}");
        if limit > 0 {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        sql
    }

    /// `INSERT [IGNORE ]INTO table SET ...`
    pub fn build_insert(
        &self,
        table: &str,
        data: impl Into<SetData>,
        ignore: bool,
        auto_quote: bool,
    ) -> String {
        let set = self.build_set(data, auto_quote);
        let ignore = if ignore { "IGNORE " } else { "" };
        format!("INSERT {ignore}INTO {table} {set}")
    }

    /// `ON DUPLICATE KEY UPDATE ...`
    pub fn build_on_duplicate_update(&self, data: impl Into<SetData>, auto_quote: bool) -> String {
        self.build_set_statement(&data.into(), auto_quote, "ON DUPLICATE KEY UPDATE")
    }

    /// `SET ...`
    pub fn build_set(&self, data: impl Into<SetData>, auto_quote: bool) -> String {
        self.build_set_statement(&data.into(), auto_quote, "SET")
    }

    /// ` IN(v1,v2,...)`, every value quoted by the connection.
    pub fn build_in_statement(&self, values: &[Value]) -> String {
        let quoted: Vec<String> = values.iter().map(|v| self.conn.quote(v)).collect();
        format!(" IN({})", quoted.join(","))
    }

    /// Render one value: NULL (and non-finite floats) verbatim, otherwise quoted or raw.
    pub fn render_value(&self, value: &Value, auto_quote: bool) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Float(f) if !f.is_finite() => "NULL".to_string(),
            v if auto_quote => self.conn.quote(v),
            v => v.to_string(),
        }
    }

    fn build_set_statement(&self, data: &SetData, auto_quote: bool, keyword: &str) -> String {
        let params = match data {
            SetData::Raw(sql) => sql.clone(),
            SetData::Fields(fields) => fields
                .iter()
                .map(|(field, value)| format!("{field} = {}", self.render_value(value, auto_quote)))
                .collect::<Vec<_>>()
                .join(", "),
        };
        format!("{keyword} {params}")
    }
}
