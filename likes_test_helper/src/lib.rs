//! Test helpers to set up database connections and fixtures.
//!
//! In-memory connections are private to one test. Tests that need
//! several connections to the same database, such as the concurrency
//! tests, use [`sqlite_file_setup`], which creates a database file
//! under a temporary directory removed when the returned
//! [`SQLiteSetupData`] is dropped.
#![deny(missing_docs)]

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use likes::models::{self, Model, Post, User};
use likes::policy::Caller;
use likes::posts::{self, NewPost};
use likes_core::db::sqlite;
use likes_core::db::{
    connect, get_backend, Backend, Connection, ConnectionManager, ConnectionSpec,
};

// Re-export as they are used by tests.
pub use likes_core::db::ConnectionMethods;

/// Used by the setup functions. Provides a connection string for the
/// database a test runs against.
pub trait SetupData {
    /// Return the connection string to use when establishing a
    /// database connection.
    fn connection_string(&self) -> &str;
}

/// Concrete [`SetupData`] for a SQLite database file.
pub struct SQLiteSetupData {
    connection_string: String,
    // Removed on drop.
    _dir: tempfile::TempDir,
}

impl SQLiteSetupData {
    /// A [`ConnectionSpec`] for this database.
    pub fn connspec(&self) -> ConnectionSpec {
        ConnectionSpec::new(sqlite::BACKEND_NAME, self.connection_string.clone())
    }

    /// Open another connection to this database.
    pub fn connect(&self) -> Connection {
        connect(&self.connspec()).unwrap()
    }

    /// A connection pool over this database.
    pub fn pool(&self, size: u32) -> r2d2::Pool<ConnectionManager> {
        r2d2::Pool::builder()
            .max_size(size)
            .build(ConnectionManager::new(self.connspec()))
            .unwrap()
    }
}

impl SetupData for SQLiteSetupData {
    fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

/// Initialise logging. Safe to call from every test.
pub fn common_setup() {
    env_logger::try_init().ok();
}

/// Create a sqlite [`Connection`] to a fresh in-memory database with
/// the schema in place.
pub fn sqlite_connection() -> Connection {
    common_setup();
    log::info!("connecting to sqlite memory database..");
    let backend = get_backend(sqlite::BACKEND_NAME).unwrap();
    let conn = backend.connect(":memory:").unwrap();
    models::setup_schema(&conn).unwrap();
    conn
}

/// Create a sqlite [`ConnectionSpec`] for an in-memory database.
pub fn sqlite_connspec() -> ConnectionSpec {
    ConnectionSpec::new(sqlite::BACKEND_NAME, ":memory:")
}

/// Create a database file in a new temporary directory, with the
/// schema in place.
pub fn sqlite_file_setup() -> SQLiteSetupData {
    common_setup();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("likes.db");
    let data = SQLiteSetupData {
        connection_string: path.to_string_lossy().into_owned(),
        _dir: dir,
    };
    log::info!("new db is `{}`", data.connection_string());
    models::setup_schema(&data.connect()).unwrap();
    data
}

/// A fixed instant, `hour` o'clock UTC on the given day.
pub fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<FixedOffset> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .unwrap()
        .fixed_offset()
}

/// Store a regular user named `username`.
pub fn create_user(conn: &impl ConnectionMethods, username: &str) -> User {
    store_user(conn, username, false)
}

/// Store a superuser named `username`.
pub fn create_superuser(conn: &impl ConnectionMethods, username: &str) -> User {
    store_user(conn, username, true)
}

fn store_user(conn: &impl ConnectionMethods, username: &str, is_superuser: bool) -> User {
    let user = User::new(
        username,
        &format!("{username}@example.com"),
        is_superuser,
        Utc::now().fixed_offset(),
    );
    user.insert(conn).unwrap();
    user
}

/// Store a post owned by `owner`.
pub fn create_post(conn: &impl ConnectionMethods, owner: &User, title: &str) -> Post {
    posts::create_post(
        conn,
        &Caller::from(owner),
        NewPost {
            title: title.to_string(),
            content: format!("{title} content"),
        },
    )
    .unwrap()
}

/// Reload `post` and return its stored counter.
pub fn stored_likes(conn: &impl ConnectionMethods, post: &Post) -> i64 {
    Post::get(conn, &post.id).unwrap().likes
}
