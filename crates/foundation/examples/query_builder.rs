//! Composing SELECT statements without a datastore.
//!
//! Run with: cargo run --example query_builder -p foundation

use foundation::{BoolOp, OrmError, Query, QueryCondition, SortDirection};
use serde_json::json;

fn main() -> Result<(), OrmError> {
    // Fluent construction
    let mut q = Query::new();
    q.set_fields(["p.ID", "p.TITLE", "a.NAME"])
        .add_from("POSTS p")
        .add_join("LEFT", "AUTHORS a", ["a.ID = p.AUTHOR_ID"], false)
        .add_where("p.PUBLISHED = 1")
        .add_where_with(
            vec!["p.VIEWS > 100", "p.FEATURED = 1"],
            BoolOp::Or,
            true,
        )
        .add_order_by("p.VIEWS", Some(SortDirection::Desc))
        .set_limit(10, None);
    println!("{q}\n");

    // Nest an extra clause inside the first condition
    q.append_where(0, "p.DELETED = 0", BoolOp::And, false)?;
    println!("{q}\n");

    // A standalone condition tree
    let mut cond = QueryCondition::group(vec!["A = 1", "B = 2"]);
    cond.add_condition(QueryCondition::not("C IS NULL"), BoolOp::Or, false);
    println!("{cond}\n");

    // The same kind of query from a property map
    let q = Query::from_properties(&json!({
        "fields": "ID, TITLE",
        "from": "POSTS",
        "where": ["AUTHOR_ID = 3", [["VIEWS > 10", "VIEWS < 20"], "OR"]],
        "orderBy": [["TITLE", "ASC"]],
        "limit": [5, 15],
    }))?;
    println!("{q}");

    Ok(())
}
