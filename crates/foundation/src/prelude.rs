//! Convenient imports for typical `foundation` usage.
//!
//! ```ignore
//! use foundation::prelude::*;
//! ```

pub use crate::{
    Attributes, BoolOp, Connection, FindOptions, FromRow, Model, ModelCollection, ModelSchema,
    OrmError, OrmResult, Query, QueryCondition, Row, RowExt, SortDirection, Value,
};

pub use crate::{ModelRegistration, ModelRegistry};

#[cfg(feature = "sqlite")]
pub use crate::SqliteConnection;
