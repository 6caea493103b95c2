use super::*;
use crate::client::Connection;
use crate::error::OrmError;
use crate::row::Row;
use crate::test_support::RecordingConnection;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingHook {
    seen: Mutex<Vec<(String, QueryResult)>>,
}

impl QueryHook for RecordingHook {
    fn after_query(&self, ctx: &QueryContext, _duration: Duration, result: &QueryResult) {
        self.seen
            .lock()
            .unwrap()
            .push((ctx.exec_sql.clone(), result.clone()));
    }
}

struct RewriteHook;

impl QueryHook for RewriteHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        HookAction::ModifySql {
            exec_sql: format!("{} LIMIT 1", ctx.exec_sql),
            canonical_sql: None,
        }
    }
}

struct DenyDeletes;

impl QueryHook for DenyDeletes {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        if ctx.query_type == QueryType::Delete {
            HookAction::Abort("deletes are disabled".into())
        } else {
            HookAction::Continue
        }
    }
}

#[test]
fn test_query_type_detection() {
    assert_eq!(QueryType::from_sql("SELECT * FROM USERS"), QueryType::Select);
    assert_eq!(QueryType::from_sql("  select * from users"), QueryType::Select);
    assert_eq!(QueryType::from_sql("(SELECT 1) UNION (SELECT 2)"), QueryType::Select);
    assert_eq!(
        QueryType::from_sql("WITH c AS (SELECT 1) SELECT * FROM c"),
        QueryType::Select
    );
    assert_eq!(
        QueryType::from_sql("WITH c AS (SELECT ')') DELETE FROM T"),
        QueryType::Delete
    );
    assert_eq!(
        QueryType::from_sql("INSERT INTO USERS (NAME) VALUES ('a')"),
        QueryType::Insert
    );
    assert_eq!(QueryType::from_sql("UPDATE USERS SET A = 1"), QueryType::Update);
    assert_eq!(QueryType::from_sql("DELETE FROM USERS"), QueryType::Delete);
    assert_eq!(QueryType::from_sql("SELECTED"), QueryType::Other);
    assert_eq!(QueryType::from_sql("CREATE TABLE T (ID INT)"), QueryType::Other);
}

#[test]
fn test_query_result_error_truncation() {
    let long = "x".repeat(600);
    let QueryResult::Error(msg) = QueryResult::error(long) else {
        panic!("expected an error result");
    };
    assert_eq!(msg.len(), 515);
    assert!(msg.ends_with("..."));
    assert_eq!(QueryResult::error("boom"), QueryResult::Error("boom".into()));
}

#[test]
fn test_beautify_sql() {
    let sql = "SELECT A\n\n   FROM T\n  WHERE ( A = 1 )";
    assert_eq!(beautify_sql(sql), "SELECT A\nFROM T\nWHERE (A = 1)");
    assert_eq!(beautify_sql("SELECT 1"), "SELECT 1");
}

#[test]
fn test_debug_hook_render_truncates() {
    let hook = SqlDebugHook::new(DebugLevel::Stack).max_sql_length(6);
    assert_eq!(hook.render("  SELECT *\nFROM T"), "SELECT...");
    assert_eq!(SqlDebugHook::default().level, DebugLevel::Basic);
    assert!(DebugLevel::Stack > DebugLevel::Basic);
}

#[test]
fn test_logging_monitor_truncation() {
    let monitor = LoggingMonitor::new().max_sql_length(10);
    assert_eq!(monitor.truncate_sql("SELECT * FROM users"), "SELECT * F...");
    assert_eq!(monitor.truncate_sql("SELECT 1"), "SELECT 1");
}

#[test]
fn test_stats_monitor() {
    let monitor = StatsMonitor::new();
    let select = QueryContext::new("SELECT * FROM USERS");
    let update = QueryContext::new("UPDATE USERS SET A = 1");

    monitor.on_query_complete(&select, Duration::from_millis(10), &QueryResult::Rows(5));
    monitor.on_query_complete(&select, Duration::from_millis(20), &QueryResult::Rows(3));
    monitor.on_query_complete(
        &update,
        Duration::from_millis(5),
        &QueryResult::error("locked"),
    );

    let stats = monitor.stats();
    assert_eq!(stats.total_queries, 3);
    assert_eq!(stats.select_count, 2);
    assert_eq!(stats.update_count, 1);
    assert_eq!(stats.failed_queries, 1);
    assert_eq!(stats.total_duration, Duration::from_millis(35));
    assert_eq!(stats.max_duration, Duration::from_millis(20));
    assert_eq!(stats.slowest_query.as_deref(), Some("SELECT * FROM USERS"));

    monitor.reset();
    assert_eq!(monitor.stats(), QueryStats::default());
}

#[test]
fn test_instrumented_reports_to_monitor() {
    let conn = RecordingConnection::new();
    conn.push_rows(vec![Row::new().with("ID", 1), Row::new().with("ID", 2)]);
    conn.push_affected(3);

    let stats = Arc::new(StatsMonitor::new());
    let db = InstrumentedConnection::new(&conn)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());

    assert_eq!(db.query("SELECT ID FROM USERS").unwrap().row_count(), 2);
    assert_eq!(db.execute("DELETE FROM USERS").unwrap(), 3);

    let stats = stats.stats();
    assert_eq!(stats.total_queries, 2);
    assert_eq!(stats.select_count, 1);
    assert_eq!(stats.delete_count, 1);
}

#[test]
fn test_instrumented_monitoring_disabled_by_default() {
    let conn = RecordingConnection::new();
    let stats = Arc::new(StatsMonitor::new());
    let db = InstrumentedConnection::new(&conn).with_monitor_arc(stats.clone());

    assert!(!db.is_monitoring_enabled());
    db.execute("UPDATE T SET A = 1").unwrap();
    assert_eq!(stats.stats().total_queries, 0);
}

#[test]
fn test_instrumented_counts_failures() {
    let conn = RecordingConnection::new();
    conn.push_execute_error("disk full");

    let stats = Arc::new(StatsMonitor::new());
    let db = InstrumentedConnection::new(&conn)
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());

    assert!(db.execute("INSERT INTO T DEFAULT VALUES").unwrap_err().is_database());
    assert_eq!(stats.stats().failed_queries, 1);
    assert_eq!(stats.stats().insert_count, 1);
}

#[test]
fn test_hook_rewrites_statement() {
    let conn = RecordingConnection::new();
    let recorder = Arc::new(RecordingHook::default());
    let db = InstrumentedConnection::new(&conn)
        .with_hook(RewriteHook)
        .add_hook_arc(recorder.clone());

    db.query("SELECT * FROM T").unwrap();
    assert_eq!(conn.last_statement().as_deref(), Some("SELECT * FROM T LIMIT 1"));

    let seen = recorder.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "SELECT * FROM T LIMIT 1");
    assert_eq!(seen[0].1, QueryResult::Rows(0));
}

#[test]
fn test_hook_abort_skips_execution() {
    let conn = RecordingConnection::new();
    let db = InstrumentedConnection::new(&conn)
        .add_hook(SqlDebugHook::new(DebugLevel::Basic))
        .add_hook(DenyDeletes);

    let err = db.execute("DELETE FROM T").unwrap_err();
    assert!(matches!(err, OrmError::Aborted(ref reason) if reason == "deletes are disabled"));
    assert!(conn.statements().is_empty());

    db.execute("UPDATE T SET A = 1").unwrap();
    assert_eq!(conn.statements(), vec!["UPDATE T SET A = 1".to_string()]);
}

#[test]
fn test_slow_query_threshold() {
    #[derive(Default)]
    struct SlowCounter(Mutex<u32>);

    impl QueryMonitor for SlowCounter {
        fn on_query_complete(&self, _: &QueryContext, _: Duration, _: &QueryResult) {}

        fn on_slow_query(&self, _: &QueryContext, _: Duration) {
            *self.0.lock().unwrap() += 1;
        }
    }

    let conn = RecordingConnection::new();
    let counter = Arc::new(SlowCounter::default());
    let db = InstrumentedConnection::new(&conn)
        .with_config(
            MonitorConfig::new()
                .with_slow_query_threshold(Duration::ZERO)
                .enable_monitoring(),
        )
        .with_monitor_arc(counter.clone());

    db.query("SELECT 1").unwrap();
    assert_eq!(*counter.0.lock().unwrap(), 1);
}

#[test]
fn test_composite_monitor_fans_out() {
    let a = Arc::new(StatsMonitor::new());
    let b = Arc::new(StatsMonitor::new());
    let composite = CompositeMonitor::new()
        .add_arc(a.clone())
        .add_arc(b.clone())
        .add(NoopMonitor);
    assert_eq!(composite.len(), 3);

    let ctx = QueryContext::new("SELECT 1").with_tag("ping");
    composite.on_query_complete(&ctx, Duration::from_millis(1), &QueryResult::Rows(1));
    assert_eq!(a.stats().total_queries, 1);
    assert_eq!(b.stats().total_queries, 1);
}

#[test]
fn test_instrumented_delegates_quote_and_last_insert_id() {
    let conn = RecordingConnection::new();
    conn.set_next_id(42);
    let db = InstrumentedConnection::new(&conn);
    assert_eq!(db.quote(&"o'k".into()), "'o''k'");
    assert_eq!(db.last_insert_id().unwrap(), crate::value::Value::Int(42));
}
