use super::*;
use crate::model::{ModelRegistry, ModelSchema};
use crate::row::Row;
use crate::test_support::RecordingConnection;
use serde_json::json;

#[test]
fn test_empty_fields_select_star() {
    let mut q = Query::new();
    q.add_from("users");
    assert_eq!(q.to_sql(), "SELECT *\nFROM users");
}

#[test]
fn test_full_round_trip() {
    let mut q = Query::new();
    q.set_fields(["A", "B"])
        .add_from("T")
        .add_where("A = 1")
        .add_order_by("A", Some(SortDirection::Desc))
        .set_limit(10, Some(5));
    assert_eq!(
        q.to_sql(),
        "SELECT A, B\nFROM T\nWHERE A = 1\nORDER BY A DESC\nLIMIT 5, 10"
    );
}

#[test]
fn test_distinct_group_by_raw_limit() {
    let mut q = Query::new();
    q.set_distinct(true)
        .add_field("CITY")
        .add_field("COUNT(*)")
        .add_from("USERS u")
        .add_from("PLACES p")
        .add_group_by("CITY")
        .add_order_by("CITY", None)
        .set_raw_limit("100");
    assert_eq!(
        q.to_sql(),
        "SELECT DISTINCT CITY, COUNT(*)\nFROM USERS u, PLACES p\nGROUP BY CITY\nORDER BY CITY\nLIMIT 100"
    );
}

#[test]
fn test_where_operators_render_after_first() {
    let mut q = Query::new();
    q.add_from("T")
        .add_where("A = 1")
        .add_where_with("B = 2", BoolOp::Or, false)
        .add_where_with(vec!["C = 3", "D = 4"], BoolOp::And, false);
    assert_eq!(
        q.to_sql(),
        "SELECT *\nFROM T\nWHERE A = 1\n OR B = 2\n AND (C = 3 AND D = 4)"
    );
}

#[test]
fn test_add_where_skips_duplicates() {
    let mut q = Query::new();
    q.add_where("A = 1")
        .add_where("A = 1")
        .add_where(QueryCondition::new("A = 1"))
        .prepend_where("A = 1");
    assert_eq!(q.wheres().len(), 1);

    // Same text with a different operator is a different condition.
    q.add_where_with("A = 1", BoolOp::Or, false);
    assert_eq!(q.wheres().len(), 2);
}

#[test]
fn test_prepend_where() {
    let mut q = Query::new();
    q.add_from("T").add_where("B = 2").prepend_where("A = 1");
    assert_eq!(q.to_sql(), "SELECT *\nFROM T\nWHERE A = 1\n AND B = 2");
}

#[test]
fn test_append_where() {
    let mut q = Query::new();
    q.add_from("T").add_where("A = 1");
    q.append_where(0, "B = 2", BoolOp::Or, false).unwrap();
    assert_eq!(q.to_sql(), "SELECT *\nFROM T\nWHERE (A = 1 OR B = 2)");

    let err = q.append_where(3, "C = 3", BoolOp::And, false).unwrap_err();
    assert!(matches!(err, OrmError::OutOfBounds { index: 3, len: 1 }));
}

#[test]
fn test_empty_conditions_are_skipped() {
    let mut q = Query::new();
    q.add_from("T")
        .add_where(QueryCondition::empty(BoolOp::And, false))
        .add_where_with("A = 1", BoolOp::Or, false);
    assert_eq!(q.to_sql(), "SELECT *\nFROM T\nWHERE A = 1");

    let mut q = Query::new();
    q.add_from("T").add_where(QueryCondition::empty(BoolOp::And, false));
    assert_eq!(q.to_sql(), "SELECT *\nFROM T");
}

#[test]
fn test_add_join_is_idempotent() {
    let mut q = Query::new();
    q.add_from("A")
        .add_join("LEFT", "B", ["B.A_ID = A.ID"], false)
        .add_join("LEFT", "B", ["B.A_ID = A.ID"], false);
    assert_eq!(q.joins().len(), 1);
    assert_eq!(q.joins()[0].on.len(), 1);
    assert_eq!(q.to_sql(), "SELECT *\nFROM A\nLEFT JOIN B ON B.A_ID = A.ID");
}

#[test]
fn test_join_merge_and_override() {
    let mut q = Query::new();
    q.add_from("A")
        .add_join("LEFT", "B", ["B.A_ID = A.ID"], false)
        .add_join("INNER", "B", [QueryCondition::new("B.ACTIVE = 1")], false);
    // Merging keeps the existing join type.
    assert_eq!(
        q.to_sql(),
        "SELECT *\nFROM A\nLEFT JOIN B ON B.A_ID = A.ID AND B.ACTIVE = 1"
    );

    q.set_join("LEFT", "B", ["B.OTHER_ID = A.ID"]);
    assert_eq!(
        q.to_sql(),
        "SELECT *\nFROM A\nLEFT JOIN B ON B.OTHER_ID = A.ID"
    );
}

#[test]
fn test_join_management() {
    let mut q = Query::new();
    q.add_from("A")
        .add_join("LEFT", "B", ["B.A_ID = A.ID"], false)
        .prepend_join("INNER", "C", ["C.A_ID = A.ID"]);
    assert_eq!(q.has_join("B"), Some(1));
    assert_eq!(q.has_join("C"), Some(0));
    assert_eq!(q.has_join("D"), None);

    assert!(q.change_join_type("B", "RIGHT"));
    assert!(q.add_join_condition("B", [QueryCondition::or("B.A_ID IS NULL")]));
    assert!(!q.set_join_condition("D", ["D.X = 1"]));
    assert_eq!(
        q.to_sql(),
        "SELECT *\nFROM A\nINNER JOIN C ON C.A_ID = A.ID\nRIGHT JOIN B ON B.A_ID = A.ID OR B.A_ID IS NULL"
    );

    assert!(q.remove_join("C"));
    assert!(!q.remove_join("C"));
    assert_eq!(q.joins().len(), 1);
}

#[test]
fn test_set_from_properties() {
    let q = Query::from_properties(&json!({
        "fields": ["A", "B"],
        "from": "T",
        "where": ["A = 1"],
        "orderBy": [["A", "DESC"]],
        "limit": [10, 5],
    }))
    .unwrap();
    assert_eq!(
        q.to_sql(),
        "SELECT A, B\nFROM T\nWHERE A = 1\nORDER BY A DESC\nLIMIT 5, 10"
    );
}

#[test]
fn test_properties_shapes() {
    let q = Query::from_properties(&json!({
        "fields": " A ,B,  C ",
        "from": ["T t"],
        "joins": ["LEFT", "U u", "u.T_ID = t.ID"],
        "where": ["A = 1", [["B = 2", "C = 3"], "OR"]],
        "groupBy": "A",
        "distinct": 1,
        "model": "Thing",
        "limit": 3,
        "unknown": "ignored",
    }))
    .unwrap();
    assert_eq!(q.fields(), ["A", "B", "C"]);
    assert_eq!(q.model(), Some("Thing"));
    assert_eq!(
        q.to_sql(),
        "SELECT DISTINCT A, B, C\nFROM T t\nLEFT JOIN U u ON u.T_ID = t.ID\nWHERE A = 1\n OR (B = 2 AND C = 3)\nGROUP BY A\nLIMIT 3"
    );
}

#[test]
fn test_set_resets_and_add_appends() {
    let mut q = Query::new();
    q.set_fields(["A"]).add_from("T").add_where("A = 1");

    q.add(&json!({"fields": "B", "where": "B = 2"})).unwrap();
    assert_eq!(q.fields(), ["A", "B"]);
    assert_eq!(q.wheres().len(), 2);

    q.set(&json!({"fields": "C", "where": null}), false).unwrap();
    assert_eq!(q.fields(), ["C"]);
    assert!(q.wheres().is_empty());
    assert_eq!(q.from_tables(), ["T"]);
}

#[test]
fn test_short_join_tuple_is_rejected() {
    let err = Query::from_properties(&json!({"joins": [["LEFT", "B"]]})).unwrap_err();
    assert!(matches!(err, OrmError::InvalidArgument(_)));
}

#[test]
fn test_bad_sort_direction_is_rejected() {
    let err = Query::from_properties(&json!({"orderBy": [["A", "SIDEWAYS"]]})).unwrap_err();
    assert!(matches!(err, OrmError::InvalidArgument(_)));
}

#[test]
fn test_run_requires_bound_model() {
    let conn = RecordingConnection::new();
    let registry = ModelRegistry::new();

    let mut q = Query::new();
    q.add_from("T");
    assert!(matches!(q.run(&registry, &conn), Err(OrmError::UnboundQuery)));

    q.set_model("Missing");
    assert!(matches!(
        q.run_count(&registry, &conn),
        Err(OrmError::UnknownModel(name)) if name == "Missing"
    ));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_run_through_registry() {
    let conn = RecordingConnection::new();
    conn.push_rows(vec![Row::new().with("ID", 1).with("NAME", "ana")])
        .push_rows(vec![Row::new().with("1", 1), Row::new().with("1", 1)]);

    let mut registry = ModelRegistry::new();
    let users = registry.register_schema(ModelSchema::builder("User", "USERS").pk("ID").build());

    let mut q = users.basic_query(&[], "");
    q.add_where("NAME = 'ana'");

    let found = q.run(&registry, &conn).unwrap().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(q.run_count(&registry, &conn).unwrap(), 2);
    assert_eq!(
        conn.statements(),
        [
            "SELECT *\nFROM USERS\nWHERE NAME = 'ana'",
            "SELECT 1\nFROM USERS\nWHERE NAME = 'ana'",
        ]
    );
}
