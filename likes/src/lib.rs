//! Like counts for a small social network.
//!
//! Users write posts and like them. Each post carries a denormalized
//! `likes` counter which always equals the number of [`Like`][models::Like]
//! rows referencing it. A user may like a given post at most once, and
//! liking or unliking is idempotent. Per-day like counts are available
//! through [`analytics::likes_per_day`], subject to the access rules in
//! [`policy`].
//!
//! Every operation takes the caller's identity explicitly as a
//! [`Caller`][policy::Caller]; there is no ambient request context.

#![deny(missing_docs)]

use thiserror::Error as ThisError;

pub mod analytics;
pub mod config;
pub mod counter;
pub mod guard;
pub mod models;
pub mod policy;
pub mod posts;
pub mod users;

pub mod db {
    //! Database helpers
    pub use likes_core::db::*;
}
pub use likes_core::query;

pub mod prelude {
    //! Common imports.
    pub use crate::db::{BackendConnection, ConnectionMethods};
    pub use crate::models::{Model, PostId, UserId};
    pub use crate::policy::Caller;
}

/// Result type that uses [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by domain operations.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Input rejected before any storage access.
    #[error("{field}: {message}")]
    Validation {
        /// Name of the offending input.
        field: String,
        /// Human-readable description.
        message: String,
    },
    /// The caller may not perform the operation.
    #[error("{0}")]
    PermissionDenied(String),
    /// The addressed object does not exist.
    #[error("Not found.")]
    NotFound,
    /// Settings are missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Storage failure.
    #[error(transparent)]
    Db(#[from] likes_core::Error),
    /// No pooled connection could be obtained.
    #[error("Connection pool error {0}")]
    Pool(#[from] r2d2::Error),
}

impl Error {
    pub(crate) fn validation(field: &str, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Name of the offending field, for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Error::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
