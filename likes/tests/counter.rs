use likes::counter::{on_like_created, on_like_deleted, recount};
use likes::guard::{like, unlike};
use likes::models::PostId;
use likes::policy::Caller;
use likes::posts::delete_post;
use likes_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn counter_follows_likes() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    let fans: Vec<_> = (0..5)
        .map(|i| create_user(&conn, &format!("fan{i}")))
        .collect();

    for fan in &fans {
        like(&mut conn, &Caller::from(fan), post.id).unwrap();
    }
    assert_eq!(stored_likes(&conn, &post), 5);
    assert_eq!(recount(&conn, post.id).unwrap(), 5);

    for fan in &fans[..2] {
        unlike(&mut conn, &Caller::from(fan), post.id).unwrap();
    }
    assert_eq!(stored_likes(&conn, &post), 3);
    assert_eq!(recount(&conn, post.id).unwrap(), 3);
}

#[test_log::test]
fn adjustments_move_by_delta() {
    let conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");

    assert!(on_like_created(&conn, post.id));
    assert!(on_like_created(&conn, post.id));
    assert!(on_like_created(&conn, post.id));
    assert!(on_like_deleted(&conn, post.id, 2));
    assert_eq!(stored_likes(&conn, &post), 1);
}

#[test_log::test]
fn deleting_nothing_does_not_touch_counter() {
    let conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    on_like_created(&conn, post.id);

    assert!(!on_like_deleted(&conn, post.id, 0));
    assert_eq!(stored_likes(&conn, &post), 1);
}

#[test_log::test]
fn missing_post_is_absorbed() {
    let conn = sqlite_connection();
    let missing = PostId::new();
    assert!(!on_like_created(&conn, missing));
    assert!(!on_like_deleted(&conn, missing, 1));
}

#[test_log::test]
fn counter_never_goes_negative() {
    let conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");

    // The store refuses, and the refusal is absorbed.
    assert!(!on_like_deleted(&conn, post.id, 1));
    assert_eq!(stored_likes(&conn, &post), 0);
}

#[test_log::test]
fn deleting_post_removes_its_likes() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    like(&mut conn, &Caller::from(&owner), post.id).unwrap();

    delete_post(&conn, &Caller::from(&owner), post.id).unwrap();
    assert_eq!(recount(&conn, post.id).unwrap(), 0);
}
