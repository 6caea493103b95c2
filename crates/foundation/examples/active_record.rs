//! Active-record models over an in-memory SQLite database.
//!
//! Run with: cargo run --example active_record -p foundation

use foundation::prelude::*;
use foundation::{DebugLevel, InstrumentedConnection, SqlDebugHook, UpdateOutcome};
use std::sync::Arc;

#[derive(Debug)]
#[allow(dead_code)]
struct Book {
    id: i64,
    title: String,
    year: Option<i64>,
}

impl FromRow for Book {
    fn from_row(row: &Row) -> OrmResult<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            year: row.try_get("year")?,
        })
    }
}

fn main() -> Result<(), OrmError> {
    let conn = InstrumentedConnection::new(SqliteConnection::open_in_memory()?)
        .with_hook(SqlDebugHook::new(DebugLevel::Basic));
    conn.inner().execute_batch(
        "CREATE TABLE BOOKS (
            ID INTEGER PRIMARY KEY AUTOINCREMENT,
            TITLE TEXT NOT NULL,
            YEAR INTEGER,
            DELETED INTEGER NOT NULL DEFAULT 0
        );",
    )?;

    let books = Arc::new(
        ModelSchema::builder("Book", "BOOKS")
            .pk("ID")
            .fields(["TITLE", "YEAR"])
            .soft_delete(true)
            .build(),
    );

    for (title, year) in [("Dune", 1965), ("Neuromancer", 1984), ("Hyperion", 1989)] {
        let book = books.create(
            &conn,
            Attributes::new().with("TITLE", title).with("YEAR", year),
            true,
        )?;
        if let Some(book) = book {
            println!("inserted {} as {:?}", title, book.id());
        }
    }

    // Load, change one field, save only that field
    if let Some(mut dune) = books.find(&conn, 1, &[])? {
        dune.set("TITLE", "Dune (1st ed.)")?;
        println!("dirty: {:?}", dune.dirty_attributes());
        dune.save(&conn)?;
    }

    // Bulk update
    if let UpdateOutcome::Affected(n) = books.update(
        &conn,
        vec![2, 3],
        &Attributes::new().with("YEAR", Value::Null),
        None,
        false,
    )? {
        println!("cleared year on {n} books");
    }

    // Soft delete and list what is left
    books.destroy(&conn, 2, None)?;
    if let Some(all) = books.all(&conn, &FindOptions::new().order_by("ID"))? {
        for book in all.decode_all::<Book>()? {
            println!("{book:?}");
        }
    }

    Ok(())
}
