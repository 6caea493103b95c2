//! # foundation
//!
//! SQL query builder and active-record model layer.
//!
//! ## Features
//!
//! - **Condition trees**: `QueryCondition` renders nested AND/OR/XOR/NOT assertions with parenthesization
//! - **Query builder**: `Query` composes SELECT statements field by field, or from a JSON property map
//! - **Statement helpers**: `SqlHelper` renders INSERT/UPDATE/DELETE/SET fragments with quoting
//! - **Active record**: `ModelSchema` finders and bulk mutators, `Model` instances with dirty tracking
//! - **Monitoring**: hooks and monitors around any `Connection`, with SQL debug logging
//! - **Configuration**: per-environment TOML with `default` fallback
//!
//! ## Query Builder
//!
//! ```ignore
//! use foundation::{Query, SortDirection};
//!
//! let mut q = Query::new();
//! q.set_fields(["A", "B"])
//!     .add_from("T")
//!     .add_where("A = 1")
//!     .add_order_by("A", Some(SortDirection::Desc))
//!     .set_limit(5, Some(10));
//!
//! // SELECT A, B
//! // FROM T
//! // WHERE A = 1
//! // ORDER BY A DESC
//! // LIMIT 10, 5
//! println!("{}", q.to_sql());
//! ```
//!
//! ## Models
//!
//! ```ignore
//! use foundation::prelude::*;
//! use std::sync::Arc;
//!
//! let conn = SqliteConnection::open_in_memory()?;
//! let users = Arc::new(ModelSchema::builder("User", "USERS").pk("ID").build());
//!
//! let mut user = users.create(&conn, Attributes::new().with("NAME", "ana"), true)?;
//! let found = users.find(&conn, 1, &[])?;
//! ```

pub mod client;
pub mod condition;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod prelude;
pub mod query;
pub mod row;
pub mod sql_helper;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(test)]
pub(crate) mod test_support;

pub use client::Connection;
pub use condition::{Assertion, BoolOp, QueryCondition};
pub use config::{DatabaseConfig, FoundationConfig};
pub use error::{OrmError, OrmResult};
pub use model::{
    Attributes, DELETED_FIELD, FindOptions, Model, ModelCollection, ModelRegistration,
    ModelRegistry, ModelSchema, ModelSchemaBuilder, Queryable, UpdateOutcome,
};
pub use monitor::{
    CompositeHook, CompositeMonitor, DebugLevel, HookAction, InstrumentedConnection,
    LoggingMonitor, MonitorConfig, NoopMonitor, QueryContext, QueryHook, QueryMonitor,
    QueryResult, QueryStats, QueryType, SqlDebugHook, StatsMonitor, beautify_sql,
};
pub use query::{Join, Limit, OrderBy, Query, SortDirection};
pub use row::{FromRow, FromValue, Row, RowExt, RowSet};
pub use sql_helper::{SetData, SqlHelper};
pub use value::{Lookup, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteConnection;

// Re-export inventory for model registration
pub use inventory;
