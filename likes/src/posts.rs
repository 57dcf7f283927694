//! Creating, reading and deleting posts.

use chrono::{DateTime, FixedOffset, Utc};
use likes_core::db::ConnectionMethods;
use likes_core::query::{BoolExpr, Order};
use serde::{Deserialize, Serialize};

use crate::models::{Model, Post, PostId, UserId};
use crate::policy::Caller;
use crate::{Error, Result};

/// Longest accepted title, in characters.
pub const TITLE_MAX_LEN: usize = 100;

/// Fields supplied when writing a post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPost {
    /// Surrounding whitespace is dropped.
    pub title: String,
    /// Must not be blank.
    pub content: String,
}

/// Store a new post owned by `caller`. It starts with no likes.
pub fn create_post<C>(conn: &C, caller: &Caller, new: NewPost) -> Result<Post>
where
    C: ConnectionMethods + ?Sized,
{
    create_post_at(conn, caller, new, Utc::now().fixed_offset())
}

/// Like [`create_post`] with an explicit creation time.
pub fn create_post_at<C>(
    conn: &C,
    caller: &Caller,
    new: NewPost,
    now: DateTime<FixedOffset>,
) -> Result<Post>
where
    C: ConnectionMethods + ?Sized,
{
    let title = new.title.trim();
    if title.is_empty() {
        return Err(Error::validation("title", "This field may not be blank."));
    }
    if title.chars().count() > TITLE_MAX_LEN {
        return Err(Error::validation(
            "title",
            format!("Ensure this field has no more than {TITLE_MAX_LEN} characters."),
        ));
    }
    let content = new.content.trim();
    if content.is_empty() {
        return Err(Error::validation("content", "This field may not be blank."));
    }
    let post = Post::new(caller.id, title, content, now);
    post.insert(conn)?;
    Ok(post)
}

/// Load a post.
pub fn get_post<C>(conn: &C, id: PostId) -> Result<Post>
where
    C: ConnectionMethods + ?Sized,
{
    Post::try_get(conn, &id)?.ok_or(Error::NotFound)
}

/// Posts, newest first, optionally only those owned by `owner`.
pub fn list_posts<C>(conn: &C, owner: Option<UserId>) -> Result<Vec<Post>>
where
    C: ConnectionMethods + ?Sized,
{
    let filter = owner.map(|owner| BoolExpr::eq("user_id", owner));
    Ok(Post::load(conn, filter, Some(&[Order::desc("created_at")]))?)
}

/// Delete a post and, through the store's cascade, its likes. Only the
/// owner or a superuser may do this.
pub fn delete_post<C>(conn: &C, caller: &Caller, id: PostId) -> Result<()>
where
    C: ConnectionMethods + ?Sized,
{
    let post = get_post(conn, id)?;
    if !caller.may_manage(post.user) {
        return Err(Error::PermissionDenied(
            "You do not have permission to perform this action.".to_string(),
        ));
    }
    if !post.delete(conn)? {
        return Err(Error::NotFound);
    }
    Ok(())
}
