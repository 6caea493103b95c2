use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook};
use regex::Regex;
use serde::Deserialize;
use std::backtrace::Backtrace;
use std::sync::OnceLock;

/// How much a [`SqlDebugHook`] reports per statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugLevel {
    /// The beautified SQL.
    Basic,
    /// The beautified SQL plus the call stack that issued it.
    Stack,
}

/// Strip blank lines, leading indentation and whitespace just inside
/// parentheses, so multi-line builder output logs compactly.
pub fn beautify_sql(sql: &str) -> String {
    static NOISE_RE: OnceLock<Regex> = OnceLock::new();
    let re = NOISE_RE.get_or_init(|| {
        Regex::new(r"(?m)^\s+|(\()\s+|\s+(\))").expect("invalid built-in SQL whitespace regex")
    });
    re.replace_all(sql, "$1$2").into_owned()
}

/// Logs every statement before it runs, on the `foundation.sql` target at
/// `debug` level.
///
/// Works whether or not monitoring is enabled on the connection.
#[derive(Debug, Clone)]
pub struct SqlDebugHook {
    pub level: DebugLevel,
    /// Truncate logged SQL to this many bytes. `None` logs it whole.
    pub max_sql_length: Option<usize>,
}

impl Default for SqlDebugHook {
    fn default() -> Self {
        Self::new(DebugLevel::Basic)
    }
}

impl SqlDebugHook {
    pub fn new(level: DebugLevel) -> Self {
        Self {
            level,
            max_sql_length: None,
        }
    }

    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    pub(crate) fn render(&self, sql: &str) -> String {
        let pretty = beautify_sql(sql);
        match self.max_sql_length {
            Some(max) if pretty.len() > max => format!("{}...", truncate_sql_bytes(&pretty, max)),
            _ => pretty,
        }
    }
}

impl QueryHook for SqlDebugHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let sql = self.render(&ctx.exec_sql);
        let tag = ctx.tag.as_deref().unwrap_or("-");
        match self.level {
            DebugLevel::Basic => tracing::debug!(
                target: "foundation.sql",
                query_type = ?ctx.query_type,
                tag,
                sql = %sql,
            ),
            DebugLevel::Stack => {
                let backtrace = Backtrace::force_capture();
                tracing::debug!(
                    target: "foundation.sql",
                    query_type = ?ctx.query_type,
                    tag,
                    sql = %sql,
                    backtrace = %backtrace,
                );
            }
        }
        HookAction::Continue
    }
}
