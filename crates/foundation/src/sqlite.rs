//! SQLite-backed [`Connection`].

use crate::client::Connection;
use crate::error::OrmResult;
use crate::row::{Row, RowSet};
use crate::value::Value;
use rusqlite::types::ValueRef;
use std::path::Path;

/// A [`Connection`] over a single SQLite database handle.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
}

impl SqliteConnection {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> OrmResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Wrap an existing rusqlite connection.
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self { conn }
    }

    /// Run several `;`-separated statements (schema setup, fixtures).
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Borrow the underlying rusqlite connection.
    pub fn inner(&self) -> &rusqlite::Connection {
        &self.conn
    }
}

fn to_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Int(i),
        ValueRef::Real(f) => Value::Float(f),
        ValueRef::Text(t) | ValueRef::Blob(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    }
}

impl Connection for SqliteConnection {
    fn query(&self, sql: &str) -> OrmResult<RowSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(r) = rows.next()? {
            let mut row = Row::new();
            for (idx, name) in columns.iter().enumerate() {
                row.push(name.as_str(), to_value(r.get_ref(idx)?));
            }
            out.push(row);
        }
        Ok(RowSet::new(out))
    }

    fn execute(&self, sql: &str) -> OrmResult<u64> {
        let affected = self.conn.execute(sql, [])?;
        Ok(affected as u64)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(Value::Int(self.conn.last_insert_rowid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_sqlite() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE T (ID INTEGER PRIMARY KEY AUTOINCREMENT, NAME TEXT, SCORE REAL);")
            .unwrap();

        let affected = conn
            .execute("INSERT INTO T (NAME, SCORE) VALUES ('it''s', 1.5)")
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(conn.last_insert_id().unwrap(), Value::Int(1));

        let rs = conn.query("SELECT ID, NAME, SCORE FROM T").unwrap();
        assert_eq!(rs.row_count(), 1);
        let row = &rs.rows()[0];
        assert_eq!(row.get("name"), Some(&Value::from("it's")));
        assert_eq!(row.get("score"), Some(&Value::Float(1.5)));
    }

    #[test]
    fn test_syntax_error_propagates() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let err = conn.query("SELEC nonsense").unwrap_err();
        assert!(err.is_database());
    }
}
