use likes::guard::{is_liked, like, like_at, unlike, LikeOutcome, UnlikeOutcome};
use likes::models::{Like, Model, PostId};
use likes::policy::Caller;
use likes::Error;
use likes_test_helper::*;
use pretty_assertions::assert_eq;

#[test_log::test]
fn like_once_then_already_liked() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let fan = create_user(&conn, "fan");
    let post = create_post(&conn, &owner, "hello");
    let caller = Caller::from(&fan);

    assert_eq!(like(&mut conn, &caller, post.id).unwrap(), LikeOutcome::Liked);
    assert_eq!(
        like(&mut conn, &caller, post.id).unwrap(),
        LikeOutcome::AlreadyLiked
    );
    assert_eq!(conn.count(Like::TABLE, None).unwrap(), 1);
    assert_eq!(stored_likes(&conn, &post), 1);
    assert!(is_liked(&conn, fan.id, post.id).unwrap());
}

#[test_log::test]
fn unlike_once_then_not_liked() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    let caller = Caller::from(&owner);

    like(&mut conn, &caller, post.id).unwrap();
    assert_eq!(
        unlike(&mut conn, &caller, post.id).unwrap(),
        UnlikeOutcome::Unliked
    );
    assert_eq!(
        unlike(&mut conn, &caller, post.id).unwrap(),
        UnlikeOutcome::NotLiked
    );
    assert_eq!(stored_likes(&conn, &post), 0);
    assert!(!is_liked(&conn, owner.id, post.id).unwrap());
}

#[test_log::test]
fn unlike_without_like_leaves_counter() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let fan = create_user(&conn, "fan");
    let post = create_post(&conn, &owner, "hello");
    like(&mut conn, &Caller::from(&owner), post.id).unwrap();

    assert_eq!(
        unlike(&mut conn, &Caller::from(&fan), post.id).unwrap(),
        UnlikeOutcome::NotLiked
    );
    assert_eq!(stored_likes(&conn, &post), 1);
}

#[test_log::test]
fn like_again_after_unlike() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    let caller = Caller::from(&owner);

    like(&mut conn, &caller, post.id).unwrap();
    unlike(&mut conn, &caller, post.id).unwrap();
    assert_eq!(like(&mut conn, &caller, post.id).unwrap(), LikeOutcome::Liked);
    assert_eq!(stored_likes(&conn, &post), 1);
}

#[test_log::test]
fn missing_post_is_not_found() {
    let mut conn = sqlite_connection();
    let fan = create_user(&conn, "fan");
    let caller = Caller::from(&fan);
    let missing = PostId::new();

    assert!(matches!(
        like(&mut conn, &caller, missing),
        Err(Error::NotFound)
    ));
    assert!(matches!(
        unlike(&mut conn, &caller, missing),
        Err(Error::NotFound)
    ));
    assert_eq!(conn.count(Like::TABLE, None).unwrap(), 0);
}

#[test_log::test]
fn like_records_day_in_its_own_offset() {
    let mut conn = sqlite_connection();
    let owner = create_user(&conn, "owner");
    let post = create_post(&conn, &owner, "hello");
    // 23:30 on the 1st at UTC-05:00 is already the 2nd in UTC.
    let when = chrono::DateTime::parse_from_rfc3339("2024-01-01T23:30:00-05:00").unwrap();

    like_at(&mut conn, &Caller::from(&owner), post.id, when).unwrap();
    let likes = Like::load(&conn, None, None).unwrap();
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].created_on.to_string(), "2024-01-01");
    assert_eq!(likes[0].created_at, when);
}
