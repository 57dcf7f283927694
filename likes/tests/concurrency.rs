use std::sync::{Arc, Barrier};
use std::thread;

use likes::counter::recount;
use likes::guard::{like, unlike, LikeOutcome};
use likes::policy::Caller;
use likes_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn distinct_users_liking_together_are_all_counted() {
    let data = sqlite_file_setup();
    let conn = data.connect();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "popular");
    let fans: Vec<_> = (0..50)
        .map(|i| create_user(&conn, &format!("fan{i}")))
        .collect();

    let pool = data.pool(8);
    let barrier = Arc::new(Barrier::new(fans.len()));
    let handles: Vec<_> = fans
        .iter()
        .map(|fan| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            let caller = Caller::from(fan);
            let post = post.id;
            thread::spawn(move || {
                barrier.wait();
                let mut conn = pool.get().unwrap();
                like(&mut *conn, &caller, post).unwrap()
            })
        })
        .collect();
    for h in handles {
        assert_eq!(h.join().unwrap(), LikeOutcome::Liked);
    }

    assert_eq!(recount(&conn, post.id).unwrap(), 50);
    assert_eq!(stored_likes(&conn, &post), 50);
}

#[test_log::test]
fn user_racing_itself_likes_once() {
    let data = sqlite_file_setup();
    let conn = data.connect();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "contested");
    let caller = Caller::from(&owner);

    let pool = data.pool(8);
    let barrier = Arc::new(Barrier::new(10));
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let pool = pool.clone();
            let barrier = barrier.clone();
            let post = post.id;
            thread::spawn(move || {
                barrier.wait();
                let mut conn = pool.get().unwrap();
                like(&mut *conn, &caller, post).unwrap()
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let liked = outcomes
        .iter()
        .filter(|o| **o == LikeOutcome::Liked)
        .count();
    assert_eq!(liked, 1);
    assert_eq!(recount(&conn, post.id).unwrap(), 1);
    assert_eq!(stored_likes(&conn, &post), 1);
}

#[test_log::test]
fn interleaved_like_and_unlike_stay_consistent() {
    let data = sqlite_file_setup();
    let conn = data.connect();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "churn");
    let fans: Vec<_> = (0..8)
        .map(|i| create_user(&conn, &format!("fan{i}")))
        .collect();

    let pool = data.pool(4);
    let handles: Vec<_> = fans
        .iter()
        .map(|fan| {
            let pool = pool.clone();
            let caller = Caller::from(fan);
            let post = post.id;
            thread::spawn(move || {
                let mut conn = pool.get().unwrap();
                for _ in 0..5 {
                    like(&mut *conn, &caller, post).unwrap();
                    unlike(&mut *conn, &caller, post).unwrap();
                }
                like(&mut *conn, &caller, post).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(recount(&conn, post.id).unwrap(), 8);
    assert_eq!(stored_likes(&conn, &post), 8);
}
