use std::sync::Arc;
use std::thread;

use likes_core::db::{connect, BackendConnection, ConnectionManager, ConnectionMethods};

mod common;
use common::*;

#[test_log::test]
fn commit_empty_transaction() {
    let mut conn = memory_connection();
    let tr = conn.transaction().unwrap();
    assert!(tr.commit().is_ok());
}

#[test_log::test]
fn rollback_discards_writes() {
    let mut conn = memory_connection();
    let tr = conn.transaction().unwrap();
    tr.insert_only("items", &[ITEM_ID], &["a".into()]).unwrap();
    assert_eq!(tr.count("items", None).unwrap(), 1);
    tr.rollback().unwrap();
    assert_eq!(conn.count("items", None).unwrap(), 0);
}

#[test_log::test]
fn drop_without_commit_rolls_back() {
    let mut conn = memory_connection();
    {
        let tr = conn.transaction().unwrap();
        tr.insert_only("items", &[ITEM_ID], &["a".into()]).unwrap();
    }
    assert_eq!(conn.count("items", None).unwrap(), 0);
}

#[test_log::test]
fn conflict_inside_transaction_leaves_it_usable() {
    let mut conn = memory_connection();
    let tr = conn.transaction().unwrap();
    tr.insert_only("items", &[ITEM_ID], &["a".into()]).unwrap();
    let err = tr
        .insert_only("items", &[ITEM_ID], &["a".into()])
        .unwrap_err();
    assert!(err.is_conflict());
    tr.insert_only("items", &[ITEM_ID], &["b".into()]).unwrap();
    tr.commit().unwrap();
    assert_eq!(conn.count("items", None).unwrap(), 2);
}

#[test_log::test]
fn concurrent_relative_updates_are_not_lost() {
    let (_dir, spec) = file_spec();
    {
        let conn = connect(&spec).unwrap();
        conn.insert_only("items", &[ITEM_ID], &["a".into()]).unwrap();
    }
    let pool = Arc::new(
        r2d2::Pool::builder()
            .max_size(8)
            .build(ConnectionManager::new(spec.clone()))
            .unwrap(),
    );
    let handles: Vec<_> = (0..16)
        .map(|_| {
            let pool = pool.clone();
            thread::spawn(move || {
                for _ in 0..10 {
                    let mut conn = pool.get().unwrap();
                    let tr = conn.transaction().unwrap();
                    tr.update_relative("items", &ITEM_ID, "a".into(), &ITEM_N, 1)
                        .unwrap();
                    tr.commit().unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let conn = pool.get().unwrap();
    let rows = conn.query("items", &[ITEM_N], None, None, None).unwrap();
    assert_eq!(rows[0].get::<i64>(0).unwrap(), 160);
}
