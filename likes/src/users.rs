//! Accounts and their activity timestamps.

use chrono::{DateTime, FixedOffset, Utc};
use likes_core::db::{BackendConnection, Column, ConnectionMethods};
use likes_core::query::BoolExpr;
use likes_core::{SqlType, ToSql};
use log::info;
use serde::{Deserialize, Serialize};

use crate::counter;
use crate::models::{Like, Model, User, UserId};
use crate::policy::Caller;
use crate::{Error, Result};

/// Longest accepted username, in characters.
pub const USERNAME_MAX_LEN: usize = 150;

const LAST_LOGIN: Column = Column::new("last_login", SqlType::Timestamp);
const LAST_REQUEST: Column = Column::new("last_request", SqlType::Timestamp);

/// Fields supplied when registering a user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Letters, digits and `@.+-_`, at most 150 characters.
    pub username: String,
    /// Must contain an `@` with text on both sides.
    pub email: String,
    /// Defaults to false.
    #[serde(default)]
    pub is_superuser: bool,
}

/// When a user last logged in and last made a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserActivity {
    /// Absent until the first login.
    pub last_login: Option<DateTime<FixedOffset>>,
    /// Absent until the first request.
    pub last_request: Option<DateTime<FixedOffset>>,
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(Error::validation("username", "This field may not be blank."));
    }
    if username.chars().count() > USERNAME_MAX_LEN {
        return Err(Error::validation(
            "username",
            format!("Ensure this field has no more than {USERNAME_MAX_LEN} characters."),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
    {
        return Err(Error::validation(
            "username",
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(Error::validation("email", "Enter a valid email address.")),
    }
}

fn taken(field: &'static str) -> Error {
    Error::validation(field, format!("A user with that {field} already exists."))
}

/// Register a user. Usernames and emails are unique.
pub fn create_user<C>(conn: &C, new: NewUser) -> Result<User>
where
    C: ConnectionMethods + ?Sized,
{
    let username = new.username.trim();
    let email = new.email.trim();
    validate_username(username)?;
    validate_email(email)?;
    for (field, value) in [("username", username), ("email", email)] {
        if conn.count(User::TABLE, Some(BoolExpr::eq(field, value)))? > 0 {
            return Err(taken(field));
        }
    }
    let user = User::new(username, email, new.is_superuser, Utc::now().fixed_offset());
    match user.insert(conn) {
        Ok(()) => Ok(user),
        // Lost a race with another registration.
        Err(likes_core::Error::Conflict(detail)) if detail.contains("email") => Err(taken("email")),
        Err(likes_core::Error::Conflict(_)) => Err(taken("username")),
        Err(e) => Err(e.into()),
    }
}

/// Load a user.
pub fn get_user<C>(conn: &C, id: UserId) -> Result<User>
where
    C: ConnectionMethods + ?Sized,
{
    User::try_get(conn, &id)?.ok_or(Error::NotFound)
}

fn set_timestamp<C>(conn: &C, id: UserId, col: &Column, at: DateTime<FixedOffset>) -> Result<()>
where
    C: ConnectionMethods + ?Sized,
{
    let n = conn.update(User::TABLE, &User::PKCOL, id.to_sql(), &[col.clone()], &[at.to_sql()])?;
    if n == 0 {
        return Err(Error::NotFound);
    }
    Ok(())
}

/// Record a login by `id` at `at`.
pub fn reset_last_login<C>(conn: &C, id: UserId, at: DateTime<FixedOffset>) -> Result<()>
where
    C: ConnectionMethods + ?Sized,
{
    set_timestamp(conn, id, &LAST_LOGIN, at)
}

/// Record a request by `id` at `at`.
pub fn reset_last_request<C>(conn: &C, id: UserId, at: DateTime<FixedOffset>) -> Result<()>
where
    C: ConnectionMethods + ?Sized,
{
    set_timestamp(conn, id, &LAST_REQUEST, at)
}

/// Activity of `user`, or of the caller when no user is named. Any
/// caller may read any user's activity.
pub fn user_activity<C>(conn: &C, caller: &Caller, user: Option<&str>) -> Result<UserActivity>
where
    C: ConnectionMethods + ?Sized,
{
    let id = match user {
        None | Some("") => caller.id,
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::validation("user", format!("\"{raw}\" is not a valid UUID.")))?,
    };
    let user = get_user(conn, id)?;
    Ok(UserActivity {
        last_login: user.last_login,
        last_request: user.last_request,
    })
}

/// Delete a user with everything they own. Only the user themselves or
/// a superuser may do this.
///
/// The user's likes of other people's posts are unliked first so those
/// posts' counters stay correct. Their own posts, and all likes of
/// those posts, go with them through the store's cascade.
pub fn delete_user<C>(conn: &mut C, caller: &Caller, id: UserId) -> Result<()>
where
    C: BackendConnection + ?Sized,
{
    let tr = conn.transaction()?;
    let user = User::try_get(&tr, &id)?.ok_or(Error::NotFound)?;
    if !caller.may_manage(user.id) {
        return Err(Error::PermissionDenied(
            "You do not have permission to perform this action.".to_string(),
        ));
    }
    let likes = Like::load(&tr, Some(BoolExpr::eq("user_id", id)), None)?;
    for like in &likes {
        if like.delete(&tr)? {
            counter::on_like_deleted(&tr, like.post, 1);
        }
    }
    user.delete(&tr)?;
    tr.commit()?;
    info!("deleted user {} and {} of their likes", user.username, likes.len());
    Ok(())
}
