//! Small two-table schema shared by the storage tests.
#![allow(dead_code)]

use likes_core::db::{self, BackendConnection, Column, Connection, ConnectionSpec};
use likes_core::schema::{OnDelete, Reference, Table, TableColumn};
use likes_core::SqlType;

pub const ITEM_ID: Column = Column::new("id", SqlType::Text);
pub const ITEM_N: Column = Column::new("n", SqlType::BigInt);
pub const TAG_ID: Column = Column::new("id", SqlType::Text);
pub const TAG_ITEM: Column = Column::new("item_id", SqlType::Text);
pub const TAG_DAY: Column = Column::new("day", SqlType::Date);

pub fn tables() -> Vec<Table> {
    vec![
        Table::new("items")
            .column(TableColumn::new("id", SqlType::Text).primary_key())
            .column(
                TableColumn::new("n", SqlType::BigInt)
                    .default_value(0i64)
                    .check("n >= 0"),
            ),
        Table::new("tags")
            .column(TableColumn::new("id", SqlType::Text).primary_key())
            .column(
                TableColumn::new("item_id", SqlType::Text).references(Reference::new(
                    "items",
                    "id",
                    OnDelete::Cascade,
                )),
            )
            .column(TableColumn::new("day", SqlType::Date))
            .unique_together(&["item_id", "day"]),
    ]
}

pub fn memory_connection() -> Connection {
    let _ = env_logger::builder().is_test(true).try_init();
    let conn = db::connect(&ConnectionSpec::new("sqlite", ":memory:")).unwrap();
    db::create_schema(&conn, &tables()).unwrap();
    conn
}

/// A file-backed database which lives as long as the returned directory.
pub fn file_spec() -> (tempfile::TempDir, ConnectionSpec) {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    let spec = ConnectionSpec::new("sqlite", path.to_string_lossy());
    let conn = db::connect(&spec).unwrap();
    db::create_schema(&conn, &tables()).unwrap();
    assert!(!conn.is_closed());
    (dir, spec)
}
