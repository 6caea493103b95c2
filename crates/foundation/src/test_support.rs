//! In-memory connection used by unit tests.

use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::row::{Row, RowSet};
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Records every statement and replays scripted results in order.
///
/// Queries with no scripted row set return an empty set; statements with no
/// scripted affected count report one affected row.
#[derive(Default)]
pub(crate) struct RecordingConnection {
    statements: RefCell<Vec<String>>,
    rows: RefCell<VecDeque<OrmResult<RowSet>>>,
    affected: RefCell<VecDeque<OrmResult<u64>>>,
    next_id: Cell<i64>,
}

impl RecordingConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_rows(&self, rows: Vec<Row>) -> &Self {
        self.rows.borrow_mut().push_back(Ok(RowSet::new(rows)));
        self
    }

    pub(crate) fn push_query_error(&self, message: &str) -> &Self {
        self.rows
            .borrow_mut()
            .push_back(Err(OrmError::Database(message.to_string())));
        self
    }

    pub(crate) fn push_affected(&self, count: u64) -> &Self {
        self.affected.borrow_mut().push_back(Ok(count));
        self
    }

    pub(crate) fn push_execute_error(&self, message: &str) -> &Self {
        self.affected
            .borrow_mut()
            .push_back(Err(OrmError::Database(message.to_string())));
        self
    }

    pub(crate) fn set_next_id(&self, id: i64) -> &Self {
        self.next_id.set(id);
        self
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    pub(crate) fn last_statement(&self) -> Option<String> {
        self.statements.borrow().last().cloned()
    }
}

impl Connection for RecordingConnection {
    fn query(&self, sql: &str) -> OrmResult<RowSet> {
        self.statements.borrow_mut().push(sql.to_string());
        self.rows
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(RowSet::default()))
    }

    fn execute(&self, sql: &str) -> OrmResult<u64> {
        self.statements.borrow_mut().push(sql.to_string());
        self.affected.borrow_mut().pop_front().unwrap_or(Ok(1))
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        Ok(Value::Int(self.next_id.get()))
    }
}
