//! Like and unlike, each at most once per user and post.
//!
//! Uniqueness is enforced by the store's `UNIQUE(user_id, post_id)`
//! constraint rather than by a read-then-write check, so two racing
//! requests from the same user cannot both create a like. The loser of
//! the race sees a conflict and reports [`LikeOutcome::AlreadyLiked`].

use chrono::{DateTime, FixedOffset, Utc};
use likes_core::db::{BackendConnection, ConnectionMethods};
use likes_core::query::BoolExpr;
use log::debug;

use crate::counter;
use crate::models::{Like, Model, Post, PostId, UserId};
use crate::policy::Caller;
use crate::{Error, Result};

/// What [`like`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LikeOutcome {
    /// A like was created and the post's counter incremented.
    Liked,
    /// The caller had already liked the post; nothing changed.
    AlreadyLiked,
}

/// What [`unlike`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnlikeOutcome {
    /// The like was removed and the post's counter decremented.
    Unliked,
    /// There was no like to remove; nothing changed.
    NotLiked,
}

/// Like `post` as `caller`, stamped with the current UTC time.
pub fn like<C>(conn: &mut C, caller: &Caller, post: PostId) -> Result<LikeOutcome>
where
    C: BackendConnection + ?Sized,
{
    like_at(conn, caller, post, Utc::now().fixed_offset())
}

/// Like `post` as `caller`, stamped with `at`. The like counts towards
/// the calendar day of `at` in its own offset.
pub fn like_at<C>(
    conn: &mut C,
    caller: &Caller,
    post: PostId,
    at: DateTime<FixedOffset>,
) -> Result<LikeOutcome>
where
    C: BackendConnection + ?Sized,
{
    let tr = conn.transaction()?;
    if !Post::exists(&tr, &post)? {
        return Err(Error::NotFound);
    }
    let like = Like::new(caller.id, post, at);
    match like.insert(&tr) {
        Ok(()) => {}
        Err(e) if e.is_conflict() => {
            debug!("user {} already likes post {post}", caller.id);
            tr.rollback()?;
            return Ok(LikeOutcome::AlreadyLiked);
        }
        Err(e) => return Err(e.into()),
    }
    counter::on_like_created(&tr, post);
    tr.commit()?;
    Ok(LikeOutcome::Liked)
}

/// Remove `caller`'s like of `post`, if there is one.
pub fn unlike<C>(conn: &mut C, caller: &Caller, post: PostId) -> Result<UnlikeOutcome>
where
    C: BackendConnection + ?Sized,
{
    let tr = conn.transaction()?;
    if !Post::exists(&tr, &post)? {
        return Err(Error::NotFound);
    }
    let n = tr.delete_where(Like::TABLE, like_filter(caller.id, post))?;
    if n == 0 {
        debug!("user {} does not like post {post}", caller.id);
        tr.rollback()?;
        return Ok(UnlikeOutcome::NotLiked);
    }
    counter::on_like_deleted(&tr, post, n);
    tr.commit()?;
    Ok(UnlikeOutcome::Unliked)
}

/// Whether `user` currently likes `post`.
pub fn is_liked<C>(conn: &C, user: UserId, post: PostId) -> Result<bool>
where
    C: ConnectionMethods + ?Sized,
{
    Ok(conn.count(Like::TABLE, Some(like_filter(user, post)))? > 0)
}

fn like_filter(user: UserId, post: PostId) -> BoolExpr {
    BoolExpr::all_of(vec![
        BoolExpr::eq("user_id", user),
        BoolExpr::eq("post_id", post),
    ])
}
