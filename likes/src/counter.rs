//! Maintenance of the denormalized `posts.likes` counter.
//!
//! The counter is only ever moved by a delta applied at the store,
//! inside the same transaction that created or deleted the like rows.
//! A failed adjustment (the post is gone, or the store refused) is
//! logged and otherwise ignored: the like operation itself has already
//! succeeded or been refused on its own terms.

use likes_core::db::ConnectionMethods;
use likes_core::query::BoolExpr;
use likes_core::ToSql;
use log::{debug, warn};

use crate::models::{Like, Model, Post, PostId, POST_LIKES};
use crate::Result;

/// Record that one like of `post` was created. Returns whether the
/// counter moved.
pub fn on_like_created<C>(conn: &C, post: PostId) -> bool
where
    C: ConnectionMethods + ?Sized,
{
    adjust(conn, post, 1)
}

/// Record that `n` likes of `post` were deleted. Returns whether the
/// counter moved; deleting nothing leaves it untouched.
pub fn on_like_deleted<C>(conn: &C, post: PostId, n: usize) -> bool
where
    C: ConnectionMethods + ?Sized,
{
    if n == 0 {
        return false;
    }
    let delta = i64::try_from(n).map_or(i64::MIN, |n| -n);
    adjust(conn, post, delta)
}

fn adjust<C>(conn: &C, post: PostId, delta: i64) -> bool
where
    C: ConnectionMethods + ?Sized,
{
    match conn.update_relative(Post::TABLE, &Post::PKCOL, post.to_sql(), &POST_LIKES, delta) {
        Ok(0) => {
            debug!("post {post} is gone, likes counter not adjusted by {delta}");
            false
        }
        Ok(_) => true,
        Err(e) => {
            warn!("could not adjust likes of post {post} by {delta}: {e}");
            false
        }
    }
}

/// The number of like rows referencing `post`, which the counter must equal.
pub fn recount<C>(conn: &C, post: PostId) -> Result<i64>
where
    C: ConnectionMethods + ?Sized,
{
    Ok(conn.count(Like::TABLE, Some(BoolExpr::eq("post_id", post)))?)
}
