//! Datastore connection trait.

use crate::error::OrmResult;
use crate::row::RowSet;
use crate::value::Value;
use std::rc::Rc;
use std::sync::Arc;

/// A blocking connection to a relational datastore.
///
/// Statements are plain SQL text: literal values are spliced in through
/// [`Connection::quote`], there are no bound parameters. Every call runs to
/// completion before returning.
pub trait Connection {
    /// Execute a statement that returns rows.
    fn query(&self, sql: &str) -> OrmResult<RowSet>;

    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str) -> OrmResult<u64>;

    /// Render a scalar as an SQL literal for this datastore.
    ///
    /// The default implementation uses [`Value::to_sql_literal`] (standard SQL quoting).
    fn quote(&self, value: &Value) -> String {
        value.to_sql_literal()
    }

    /// Identifier assigned to the last inserted row.
    fn last_insert_id(&self) -> OrmResult<Value>;
}

impl<C: Connection + ?Sized> Connection for &C {
    fn query(&self, sql: &str) -> OrmResult<RowSet> {
        (**self).query(sql)
    }

    fn execute(&self, sql: &str) -> OrmResult<u64> {
        (**self).execute(sql)
    }

    fn quote(&self, value: &Value) -> String {
        (**self).quote(value)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        (**self).last_insert_id()
    }
}

macro_rules! impl_connection_for_pointer {
    ($($ptr:ident),*) => {
        $(impl<C: Connection + ?Sized> Connection for $ptr<C> {
            fn query(&self, sql: &str) -> OrmResult<RowSet> {
                (**self).query(sql)
            }

            fn execute(&self, sql: &str) -> OrmResult<u64> {
                (**self).execute(sql)
            }

            fn quote(&self, value: &Value) -> String {
                (**self).quote(value)
            }

            fn last_insert_id(&self) -> OrmResult<Value> {
                (**self).last_insert_id()
            }
        })*
    };
}

impl_connection_for_pointer!(Box, Rc, Arc);
