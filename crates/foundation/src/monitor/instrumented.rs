use super::config::MonitorConfig;
use super::monitors::{CompositeHook, NoopMonitor};
use super::types::{HookAction, QueryContext, QueryHook, QueryMonitor, QueryResult, QueryType};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::row::RowSet;
use crate::value::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A [`Connection`] that runs statements through a hook and a monitor.
///
/// Monitoring must be enabled through [`MonitorConfig::enable_monitoring`];
/// the hook runs regardless.
pub struct InstrumentedConnection<C> {
    conn: C,
    monitor: Arc<dyn QueryMonitor>,
    hook: Option<Arc<dyn QueryHook>>,
    config: MonitorConfig,
}

impl<C: Connection> InstrumentedConnection<C> {
    /// Wrap a connection with no hook and monitoring disabled.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            monitor: Arc::new(NoopMonitor),
            hook: None,
            config: MonitorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_monitor<M: QueryMonitor + 'static>(mut self, monitor: M) -> Self {
        self.monitor = Arc::new(monitor);
        self
    }

    /// Set the monitor from an `Arc`, keeping a handle for the caller (e.g. a
    /// shared [`StatsMonitor`](super::StatsMonitor)).
    pub fn with_monitor_arc(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    /// Replace the hook.
    pub fn with_hook<H: QueryHook + 'static>(mut self, hook: H) -> Self {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Add a hook after any existing one.
    pub fn add_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_hook_arc(Arc::new(hook))
    }

    pub fn add_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hook = Some(match self.hook.take() {
            None => hook,
            Some(existing) => Arc::new(CompositeHook::new().add_arc(existing).add_arc(hook)),
        });
        self
    }

    pub fn is_monitoring_enabled(&self) -> bool {
        self.config.monitoring_enabled
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MonitorConfig {
        &mut self.config
    }

    pub fn inner(&self) -> &C {
        &self.conn
    }

    pub fn into_inner(self) -> C {
        self.conn
    }

    fn apply_hook(&self, ctx: &mut QueryContext) -> OrmResult<()> {
        let Some(hook) = &self.hook else {
            return Ok(());
        };

        match hook.before_query(ctx) {
            HookAction::Continue => Ok(()),
            HookAction::ModifySql {
                exec_sql,
                canonical_sql,
            } => {
                ctx.exec_sql = exec_sql;
                if let Some(canonical_sql) = canonical_sql {
                    ctx.canonical_sql = canonical_sql;
                }
                ctx.query_type = QueryType::from_sql(&ctx.canonical_sql);
                Ok(())
            }
            HookAction::Abort(reason) => {
                tracing::warn!(
                    target: "foundation.sql",
                    reason = %reason,
                    sql = %ctx.canonical_sql,
                    "statement aborted by hook"
                );
                Err(OrmError::Aborted(reason))
            }
        }
    }

    fn report_result(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult) {
        if let Some(hook) = &self.hook {
            hook.after_query(ctx, duration, result);
        }

        if !self.config.monitoring_enabled {
            return;
        }

        self.monitor.on_query_complete(ctx, duration, result);

        if let Some(threshold) = self.config.slow_query_threshold {
            if duration > threshold {
                self.monitor.on_slow_query(ctx, duration);
            }
        }
    }

    fn run<T>(
        &self,
        sql: &str,
        exec: impl FnOnce(&C, &str) -> OrmResult<T>,
        outcome: impl FnOnce(&T) -> QueryResult,
    ) -> OrmResult<T> {
        let mut ctx = QueryContext::new(sql);
        self.apply_hook(&mut ctx)?;

        if self.config.monitoring_enabled {
            self.monitor.on_query_start(&ctx);
        }

        let start = Instant::now();
        let result = exec(&self.conn, &ctx.exec_sql);
        let duration = start.elapsed();

        let query_result = match &result {
            Ok(value) => outcome(value),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.report_result(&ctx, duration, &query_result);
        result
    }
}

impl<C: Connection> Connection for InstrumentedConnection<C> {
    fn query(&self, sql: &str) -> OrmResult<RowSet> {
        self.run(sql, |conn, sql| conn.query(sql), |rs| QueryResult::Rows(rs.row_count()))
    }

    fn execute(&self, sql: &str) -> OrmResult<u64> {
        self.run(sql, |conn, sql| conn.execute(sql), |n| QueryResult::Affected(*n))
    }

    fn quote(&self, value: &Value) -> String {
        self.conn.quote(value)
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        self.conn.last_insert_id()
    }
}

impl<C> std::fmt::Debug for InstrumentedConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstrumentedConnection")
            .field("config", &self.config)
            .field("has_hook", &self.hook.is_some())
            .finish()
    }
}
