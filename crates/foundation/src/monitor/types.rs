use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// The kind of statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// DDL, `REPLACE`, pragmas and anything else
    Other,
}

impl QueryType {
    /// Detect the statement kind from its leading keyword.
    ///
    /// Leading whitespace and opening parentheses are skipped, so
    /// `(SELECT ...) UNION (...)` counts as a select. `WITH` is treated as a
    /// select unless the statement after the CTE list is a mutation.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if starts_with_keyword(trimmed, "SELECT") {
            QueryType::Select
        } else if starts_with_keyword(trimmed, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            QueryType::Delete
        } else if starts_with_keyword(trimmed, "WITH") {
            Self::detect_cte_dml(trimmed)
        } else {
            QueryType::Other
        }
    }

    fn detect_cte_dml(sql: &str) -> Self {
        let mut depth: i32 = 0;
        let mut last_top_level = 0;
        let mut in_string = false;
        for (i, c) in sql.char_indices() {
            match c {
                '\'' => in_string = !in_string,
                '(' if !in_string => depth += 1,
                ')' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        last_top_level = i + 1;
                    }
                }
                _ => {}
            }
        }

        let remainder = sql[last_top_level..].trim_start();
        if starts_with_keyword(remainder, "INSERT") {
            QueryType::Insert
        } else if starts_with_keyword(remainder, "UPDATE") {
            QueryType::Update
        } else if starts_with_keyword(remainder, "DELETE") {
            QueryType::Delete
        } else {
            QueryType::Select
        }
    }
}

fn starts_with_keyword(sql: &str, keyword: &str) -> bool {
    sql.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && sql[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_')
}

/// What a hook or monitor knows about a statement.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// SQL as issued by the caller, used as the aggregation key.
    pub canonical_sql: String,
    /// SQL actually sent to the datastore (may be rewritten by a hook).
    pub exec_sql: String,
    pub query_type: QueryType,
    /// Optional statement name.
    pub tag: Option<String>,
    /// Extra low-cardinality fields for observability.
    pub fields: BTreeMap<String, String>,
}

impl QueryContext {
    pub fn new(sql: &str) -> Self {
        Self {
            canonical_sql: sql.to_string(),
            exec_sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            tag: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Maximum length for error messages in `QueryResult::Error`.
const MAX_ERROR_LEN: usize = 512;

/// Outcome of a statement, as reported to monitors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Rows returned by a query.
    Rows(usize),
    /// Rows affected by a mutation.
    Affected(u64),
    /// Failure message, truncated to 512 bytes.
    Error(String),
}

impl QueryResult {
    /// Error result with the message truncated.
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            let truncated = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN);
            Self::Error(format!("{truncated}..."))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Affected(n) => write!(f, "{n} affected"),
            QueryResult::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Receives timing and outcome of executed statements.
pub trait QueryMonitor: Send + Sync {
    /// Called before a statement runs.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after a statement completes, successfully or not.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, result: &QueryResult);

    /// Called when a statement exceeds the slow query threshold.
    fn on_slow_query(&self, _ctx: &QueryContext, _duration: Duration) {}
}

/// Decision returned by [`QueryHook::before_query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    /// Run the statement unchanged.
    Continue,
    /// Run a different statement.
    ModifySql {
        /// SQL to send to the datastore.
        exec_sql: String,
        /// Optional replacement for the aggregation key.
        canonical_sql: Option<String>,
    },
    /// Refuse to run the statement.
    Abort(String),
}

/// Intercepts statements before and after execution.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        let _ = ctx;
        HookAction::Continue
    }

    /// Called after execution, before monitors see the result.
    fn after_query(&self, _ctx: &QueryContext, _duration: Duration, _result: &QueryResult) {}
}
