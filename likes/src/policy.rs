//! Who may ask about whose likes.

use crate::models::{User, UserId};
use crate::{Error, Result};

/// Identity of whoever invoked an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Caller {
    /// The calling user.
    pub id: UserId,
    /// Superusers may read analytics about any user.
    pub is_superuser: bool,
}

impl Caller {
    /// An ordinary user.
    pub fn user(id: UserId) -> Self {
        Caller {
            id,
            is_superuser: false,
        }
    }

    /// A privileged user.
    pub fn superuser(id: UserId) -> Self {
        Caller {
            id,
            is_superuser: true,
        }
    }

    /// Whether the caller may modify an object owned by `owner`.
    pub fn may_manage(&self, owner: UserId) -> bool {
        self.is_superuser || self.id == owner
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Caller {
            id: user.id,
            is_superuser: user.is_superuser,
        }
    }
}

/// The raw `user` filter of an analytics request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserSelector {
    /// No filter given.
    Own,
    /// The literal `all`.
    All,
    /// A specific user, possibly the caller.
    User(UserId),
}

impl UserSelector {
    /// Parse the `user` filter. Absent or empty means the caller's own
    /// posts.
    pub fn parse(raw: Option<&str>) -> Result<Self> {
        match raw {
            None | Some("") => Ok(UserSelector::Own),
            Some("all") => Ok(UserSelector::All),
            Some(s) => s
                .parse()
                .map(UserSelector::User)
                .map_err(|_| Error::validation("user", format!("\"{s}\" is not a valid UUID."))),
        }
    }
}

/// Whose posts an analytics query counts likes on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// Likes on posts owned by this user.
    OwnedBy(UserId),
    /// Likes on every post.
    Everyone,
}

/// Decide the scope of an analytics request, or refuse it.
pub fn resolve_scope(caller: &Caller, selector: UserSelector) -> Result<Scope> {
    match selector {
        UserSelector::Own => Ok(Scope::OwnedBy(caller.id)),
        UserSelector::User(id) if id == caller.id => Ok(Scope::OwnedBy(id)),
        UserSelector::All if caller.is_superuser => Ok(Scope::Everyone),
        UserSelector::All => Err(denied("all users")),
        UserSelector::User(id) if caller.is_superuser => Ok(Scope::OwnedBy(id)),
        UserSelector::User(_) => Err(denied("other users")),
    }
}

fn denied(whom: &str) -> Error {
    Error::PermissionDenied(format!(
        "Only superusers are allowed to request {whom} analytics."
    ))
}
