use likes_core::db::{connect, BackendConnection, ConnectionMethods, ConnectionSpec};
use likes_core::query::{BoolExpr, Column as QColumn, Join, Order};
use likes_core::{Error, GroupCount, SqlType, SqlVal};

use chrono::NaiveDate;
use pretty_assertions::assert_eq;

mod common;
use common::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

fn add_item(conn: &impl ConnectionMethods, id: &str) {
    conn.insert_only("items", &[ITEM_ID], &[id.into()]).unwrap();
}

fn add_tag(conn: &impl ConnectionMethods, id: &str, item: &str, d: NaiveDate) -> likes_core::Result<()> {
    conn.insert_only(
        "tags",
        &[TAG_ID, TAG_ITEM, TAG_DAY],
        &[id.into(), item.into(), d.into()],
    )
}

#[test_log::test]
fn connection_not_closed() {
    let conn = memory_connection();
    assert!(!conn.is_closed());
    assert_eq!(conn.backend_name(), "sqlite");
}

#[test]
fn unknown_backend() {
    let spec = ConnectionSpec::new("nosuchdb", "");
    assert!(matches!(connect(&spec), Err(Error::UnknownBackend(name)) if name == "nosuchdb"));
    assert!(spec.get_backend().is_err());
}

#[test]
fn spec_save_and_load_in_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let spec = ConnectionSpec::new("sqlite", "some.db");
    spec.save(dir.path()).unwrap();
    assert!(dir.path().join("connection.json").exists());
    let loaded = ConnectionSpec::load(dir.path()).unwrap();
    assert_eq!(loaded, spec);
}

#[test_log::test]
fn schema_creation_is_idempotent() {
    let conn = memory_connection();
    assert!(conn.has_table("items").unwrap());
    assert!(conn.has_table("tags").unwrap());
    assert!(!conn.has_table("nope").unwrap());
    likes_core::db::create_schema(&conn, &tables()).unwrap();
}

#[test_log::test]
fn insert_then_query_with_defaults() {
    let conn = memory_connection();
    add_item(&conn, "a");
    add_item(&conn, "b");
    let rows = conn
        .query(
            "items",
            &[ITEM_ID, ITEM_N],
            None,
            None,
            Some(&[Order::desc("id")][..]),
        )
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get::<String>(0).unwrap(), "b");
    assert_eq!(rows[0].get::<i64>(1).unwrap(), 0);
    assert!(rows[0].get::<i64>(2).is_err());
}

#[test_log::test]
fn duplicate_key_is_conflict() {
    let conn = memory_connection();
    add_item(&conn, "a");
    let err = conn
        .insert_only("items", &[ITEM_ID], &["a".into()])
        .unwrap_err();
    assert!(err.is_conflict(), "{err:?}");

    add_tag(&conn, "t1", "a", day(1)).unwrap();
    let err = add_tag(&conn, "t2", "a", day(1)).unwrap_err();
    assert!(err.is_conflict(), "{err:?}");
    assert_eq!(conn.count("tags", None).unwrap(), 1);
}

#[test_log::test]
fn foreign_key_violation_is_not_conflict() {
    let conn = memory_connection();
    let err = add_tag(&conn, "t1", "missing", day(1)).unwrap_err();
    assert!(matches!(err, Error::Constraint(_)), "{err:?}");
}

#[test_log::test]
fn relative_update_is_applied_by_store() {
    let conn = memory_connection();
    add_item(&conn, "a");
    let n = conn
        .update_relative("items", &ITEM_ID, "a".into(), &ITEM_N, 3)
        .unwrap();
    assert_eq!(n, 1);
    conn.update_relative("items", &ITEM_ID, "a".into(), &ITEM_N, -1)
        .unwrap();
    assert_eq!(
        conn.count("items", Some(BoolExpr::eq("n", 2i64))).unwrap(),
        1
    );

    // Missing rows are reported, not errors.
    let n = conn
        .update_relative("items", &ITEM_ID, "zzz".into(), &ITEM_N, 1)
        .unwrap();
    assert_eq!(n, 0);
}

#[test_log::test]
fn relative_update_below_zero_violates_check() {
    let conn = memory_connection();
    add_item(&conn, "a");
    let err = conn
        .update_relative("items", &ITEM_ID, "a".into(), &ITEM_N, -1)
        .unwrap_err();
    assert!(matches!(err, Error::Constraint(_)), "{err:?}");
}

#[test_log::test]
fn update_sets_columns() {
    let conn = memory_connection();
    add_item(&conn, "a");
    let n = conn
        .update("items", &ITEM_ID, "a".into(), &[ITEM_N], &[SqlVal::BigInt(7)])
        .unwrap();
    assert_eq!(n, 1);
    let rows = conn
        .query("items", &[ITEM_N], Some(BoolExpr::eq("id", "a")), Some(1), None)
        .unwrap();
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 7);
}

#[test_log::test]
fn delete_where_counts_and_cascades() {
    let conn = memory_connection();
    add_item(&conn, "a");
    add_tag(&conn, "t1", "a", day(1)).unwrap();
    add_tag(&conn, "t2", "a", day(2)).unwrap();
    assert_eq!(
        conn.delete_where("tags", BoolExpr::eq("id", "nope")).unwrap(),
        0
    );
    assert_eq!(conn.delete_where("items", BoolExpr::eq("id", "a")).unwrap(), 1);
    assert_eq!(conn.count("tags", None).unwrap(), 0);
}

#[test_log::test]
fn grouped_count_ascending_without_empty_groups() {
    let conn = memory_connection();
    add_item(&conn, "a");
    add_item(&conn, "b");
    add_tag(&conn, "t1", "a", day(5)).unwrap();
    add_tag(&conn, "t2", "b", day(5)).unwrap();
    add_tag(&conn, "t3", "a", day(2)).unwrap();
    add_tag(&conn, "t4", "b", day(9)).unwrap();

    let all = GroupCount::new("tags", QColumn::new("tags", "day"), SqlType::Date)
        .load(&conn)
        .unwrap();
    assert_eq!(
        all,
        vec![
            (SqlVal::Date(day(2)), 1),
            (SqlVal::Date(day(5)), 2),
            (SqlVal::Date(day(9)), 1),
        ]
    );

    let only_a = GroupCount::new("tags", QColumn::new("tags", "day"), SqlType::Date)
        .join(Join::Inner {
            join_table: "items",
            col1: QColumn::new("tags", "item_id"),
            col2: QColumn::new("items", "id"),
        })
        .filter(BoolExpr::all_of(vec![
            BoolExpr::eq("items.id", "a"),
            BoolExpr::ge("tags.day", day(3)),
        ]))
        .load(&conn)
        .unwrap();
    assert_eq!(only_a, vec![(SqlVal::Date(day(5)), 1)]);
}
