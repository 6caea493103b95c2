//! Property-built queries run through inventory-registered models.

#![cfg(feature = "sqlite")]

use foundation::prelude::*;
use foundation::{InstrumentedConnection, MonitorConfig, QueryType, StatsMonitor};
use serde_json::json;
use std::sync::Arc;

fn register_blog(registry: &mut ModelRegistry) {
    registry.register_schema(
        ModelSchema::builder("Post", "POSTS")
            .pk("ID")
            .fields(["TITLE", "AUTHOR_ID", "VIEWS"])
            .build(),
    );
    registry.register_schema(
        ModelSchema::builder("Author", "AUTHORS")
            .pk("ID")
            .fields(["NAME"])
            .build(),
    );
}

foundation::inventory::submit! {
    ModelRegistration { register_fn: register_blog }
}

fn setup() -> SqliteConnection {
    let conn = SqliteConnection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE AUTHORS (ID INTEGER PRIMARY KEY AUTOINCREMENT, NAME TEXT);
         CREATE TABLE POSTS (
             ID INTEGER PRIMARY KEY AUTOINCREMENT,
             TITLE TEXT,
             AUTHOR_ID INTEGER,
             VIEWS INTEGER NOT NULL DEFAULT 0
         );
         INSERT INTO AUTHORS (NAME) VALUES ('ana'), ('bea');
         INSERT INTO POSTS (TITLE, AUTHOR_ID, VIEWS) VALUES
             ('intro', 1, 10),
             ('ownership', 1, 250),
             ('lifetimes', 2, 120),
             ('traits', 2, 5);",
    )
    .unwrap();
    conn
}

fn titles(found: &ModelCollection) -> Vec<String> {
    found
        .iter()
        .map(|m| m.get("TITLE").unwrap().to_string())
        .collect()
}

#[test]
fn inventory_registers_models() {
    let registry = ModelRegistry::from_inventory();
    assert!(registry.contains("Post"));
    assert!(registry.contains("Author"));
    assert_eq!(registry.schema("Post").unwrap().table(), "POSTS");
}

#[test]
fn properties_query_with_join() {
    let conn = setup();
    let registry = ModelRegistry::from_inventory();

    let query = Query::from_properties(&json!({
        "model": "Post",
        "fields": "p.ID, p.TITLE, p.VIEWS",
        "from": "POSTS p",
        "joins": ["INNER", "AUTHORS a", "a.ID = p.AUTHOR_ID"],
        "where": ["a.NAME = 'bea'", [["p.VIEWS > 100", "p.TITLE = 'traits'"], "OR"]],
        "orderBy": [["p.VIEWS", "DESC"]],
    }))
    .unwrap();

    let found = query.run(&registry, &conn).unwrap().unwrap();
    assert_eq!(titles(&found), ["lifetimes", "traits"]);
    assert_eq!(query.run_count(&registry, &conn).unwrap(), 2);
}

#[test]
fn properties_limit_and_append() {
    let conn = setup();
    let registry = ModelRegistry::from_inventory();

    let mut query = Query::from_properties(&json!({
        "model": "Post",
        "from": "POSTS",
        "orderBy": [["VIEWS"]],
        "limit": [2, 1],
    }))
    .unwrap();
    let found = query.run(&registry, &conn).unwrap().unwrap();
    assert_eq!(titles(&found), ["intro", "lifetimes"]);

    query.add(&json!({"where": "AUTHOR_ID = 1"})).unwrap();
    query.set(&json!({"limit": null}), false).unwrap();
    let found = query.run(&registry, &conn).unwrap().unwrap();
    assert_eq!(titles(&found), ["intro", "ownership"]);
}

#[test]
fn empty_result_is_none() {
    let conn = setup();
    let registry = ModelRegistry::from_inventory();

    let query = Query::from_properties(&json!({
        "model": "Author",
        "from": "AUTHORS",
        "where": "NAME = 'nobody'",
    }))
    .unwrap();
    assert!(query.run(&registry, &conn).unwrap().is_none());
    assert_eq!(query.run_count(&registry, &conn).unwrap(), 0);
}

#[test]
fn monitored_connection_counts_statements() {
    let stats = Arc::new(StatsMonitor::new());
    let conn = InstrumentedConnection::new(setup())
        .with_config(MonitorConfig::new().enable_monitoring())
        .with_monitor_arc(stats.clone());
    let registry = ModelRegistry::from_inventory();
    let posts = registry.schema("Post").unwrap();

    let mut post = posts.find(&conn, 1, &[]).unwrap().unwrap();
    post.set("VIEWS", 11).unwrap();
    post.save(&conn).unwrap();
    posts
        .create(&conn, Attributes::new().with("TITLE", "macros").with("AUTHOR_ID", 1), true)
        .unwrap()
        .unwrap();

    let snapshot = stats.stats();
    assert_eq!(snapshot.select_count, 1);
    assert_eq!(snapshot.update_count, 1);
    assert_eq!(snapshot.insert_count, 1);
    assert_eq!(snapshot.failed_queries, 0);
    assert_eq!(QueryType::from_sql("SELECT 1"), QueryType::Select);
}
