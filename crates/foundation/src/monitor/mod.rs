//! Statement monitoring and hooks.
//!
//! [`InstrumentedConnection`] wraps any [`Connection`](crate::client::Connection)
//! and runs every statement through an optional [`QueryHook`] (inspect, rewrite
//! or abort before execution) and a [`QueryMonitor`] (timing and outcome after
//! execution).
//!
//! ```ignore
//! use foundation::monitor::{DebugLevel, InstrumentedConnection, LoggingMonitor, MonitorConfig, SqlDebugHook};
//! use std::time::Duration;
//!
//! let conn = InstrumentedConnection::new(SqliteConnection::open_in_memory()?)
//!     .with_config(
//!         MonitorConfig::new()
//!             .with_slow_query_threshold(Duration::from_millis(250))
//!             .enable_monitoring(),
//!     )
//!     .with_monitor(LoggingMonitor::new())
//!     .add_hook(SqlDebugHook::new(DebugLevel::Basic));
//! ```

mod config;
mod debug_hook;
mod instrumented;
mod monitors;
mod types;

#[cfg(test)]
mod tests;

pub use config::MonitorConfig;
pub use debug_hook::{DebugLevel, SqlDebugHook, beautify_sql};
pub use instrumented::InstrumentedConnection;
pub use monitors::{
    CompositeHook, CompositeMonitor, LoggingMonitor, NoopMonitor, QueryStats, StatsMonitor,
};
pub use types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};

pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
