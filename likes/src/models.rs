//! Persistent objects and the schema they live in.
#![allow(missing_docs)]

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use likes_core::db::{self, BackendConnection, Column, ConnectionMethods, Row};
use likes_core::query::{BoolExpr, Order};
use likes_core::schema::{OnDelete, Reference, Table, TableColumn};
use likes_core::{Error as CoreError, FieldType, FromSql, IntoSql, SqlType, SqlVal, ToSql};

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A new random identifier.
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }
            /// The underlying uuid.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }
        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }
        impl FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Uuid::parse_str(s).map($name)
            }
        }
        impl ToSql for $name {
            fn to_sql(&self) -> SqlVal {
                self.0.to_sql()
            }
        }
        impl IntoSql for $name {
            fn into_sql(self) -> SqlVal {
                self.0.into_sql()
            }
        }
        impl FromSql for $name {
            fn from_sql(val: SqlVal) -> likes_core::Result<Self> {
                Uuid::from_sql(val).map($name)
            }
        }
        impl FieldType for $name {
            const SQLTYPE: SqlType = SqlType::Text;
        }
    };
}

uuid_id!(
    /// Identifies a [`User`].
    UserId
);
uuid_id!(
    /// Identifies a [`Post`].
    PostId
);
uuid_id!(
    /// Identifies a [`Like`].
    LikeId
);

/// A row type stored in its own table with a single-column primary key.
///
/// `COLUMNS` lists every column in the order [`Model::from_row`] reads
/// and [`Model::values`] writes them.
pub trait Model: Sized {
    /// Primary key type.
    type PK: ToSql + fmt::Display;
    /// Table name.
    const TABLE: &'static str;
    /// Primary key column.
    const PKCOL: Column;
    /// All columns, primary key first.
    const COLUMNS: &'static [Column];

    /// Primary key of this object.
    fn pk(&self) -> Self::PK;
    /// Decode a row loaded with [`Model::COLUMNS`].
    fn from_row(row: &Row) -> likes_core::Result<Self>;
    /// Values for every column in [`Model::COLUMNS`] order.
    fn values(&self) -> Vec<SqlVal>;

    /// Load the object with primary key `pk`, if there is one.
    fn try_get<C>(conn: &C, pk: &Self::PK) -> likes_core::Result<Option<Self>>
    where
        C: ConnectionMethods + ?Sized,
    {
        let rows = conn.query(
            Self::TABLE,
            Self::COLUMNS,
            Some(BoolExpr::eq(Self::PKCOL.name(), pk.to_sql())),
            Some(1),
            None,
        )?;
        rows.first().map(Self::from_row).transpose()
    }

    /// Load the object with primary key `pk`. Fails with
    /// [`NoSuchObject`][likes_core::Error::NoSuchObject] if it does not exist.
    fn get<C>(conn: &C, pk: &Self::PK) -> likes_core::Result<Self>
    where
        C: ConnectionMethods + ?Sized,
    {
        Self::try_get(conn, pk)?.ok_or(CoreError::NoSuchObject)
    }

    /// Load every object matching `filter`.
    fn load<C>(
        conn: &C,
        filter: Option<BoolExpr>,
        order: Option<&[Order]>,
    ) -> likes_core::Result<Vec<Self>>
    where
        C: ConnectionMethods + ?Sized,
    {
        conn.query(Self::TABLE, Self::COLUMNS, filter, None, order)?
            .iter()
            .map(Self::from_row)
            .collect()
    }

    /// Whether an object with primary key `pk` exists.
    fn exists<C>(conn: &C, pk: &Self::PK) -> likes_core::Result<bool>
    where
        C: ConnectionMethods + ?Sized,
    {
        Ok(conn.count(
            Self::TABLE,
            Some(BoolExpr::eq(Self::PKCOL.name(), pk.to_sql())),
        )? > 0)
    }

    /// Insert this object. Uniqueness violations surface as
    /// [`Conflict`][likes_core::Error::Conflict].
    fn insert<C>(&self, conn: &C) -> likes_core::Result<()>
    where
        C: ConnectionMethods + ?Sized,
    {
        conn.insert_only(Self::TABLE, Self::COLUMNS, &self.values())
    }

    /// Delete this object. Returns whether a row was removed.
    fn delete<C>(&self, conn: &C) -> likes_core::Result<bool>
    where
        C: ConnectionMethods + ?Sized,
    {
        let n = conn.delete_where(
            Self::TABLE,
            BoolExpr::eq(Self::PKCOL.name(), self.pk().to_sql()),
        )?;
        Ok(n > 0)
    }
}

/// An account. Credentials live elsewhere; the core only needs the
/// identity, the privilege flag and activity timestamps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<FixedOffset>>,
    pub last_request: Option<DateTime<FixedOffset>>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl User {
    /// A new, not yet stored user.
    pub fn new(username: &str, email: &str, is_superuser: bool, now: DateTime<FixedOffset>) -> Self {
        User {
            id: UserId::new(),
            username: username.to_string(),
            email: email.to_string(),
            is_superuser,
            last_login: None,
            last_request: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Model for User {
    type PK = UserId;
    const TABLE: &'static str = "users";
    const PKCOL: Column = Column::new("id", SqlType::Text);
    const COLUMNS: &'static [Column] = &[
        Column::new("id", SqlType::Text),
        Column::new("username", SqlType::Text),
        Column::new("email", SqlType::Text),
        Column::new("is_superuser", SqlType::Bool),
        Column::new("last_login", SqlType::Timestamp),
        Column::new("last_request", SqlType::Timestamp),
        Column::new("created_at", SqlType::Timestamp),
        Column::new("updated_at", SqlType::Timestamp),
    ];

    fn pk(&self) -> UserId {
        self.id
    }
    fn from_row(row: &Row) -> likes_core::Result<Self> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            is_superuser: row.get(3)?,
            last_login: row.get(4)?,
            last_request: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
    fn values(&self) -> Vec<SqlVal> {
        vec![
            self.id.to_sql(),
            self.username.to_sql(),
            self.email.to_sql(),
            self.is_superuser.to_sql(),
            self.last_login.to_sql(),
            self.last_request.to_sql(),
            self.created_at.to_sql(),
            self.updated_at.to_sql(),
        ]
    }
}

/// A post. `likes` is the denormalized number of [`Like`] rows
/// referencing it and is only ever changed by relative updates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user: UserId,
    pub title: String,
    pub content: String,
    pub likes: i64,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl Post {
    /// A new, not yet stored post with no likes.
    pub fn new(user: UserId, title: &str, content: &str, now: DateTime<FixedOffset>) -> Self {
        Post {
            id: PostId::new(),
            user,
            title: title.to_string(),
            content: content.to_string(),
            likes: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The `posts.likes` counter column.
pub const POST_LIKES: Column = Column::new("likes", SqlType::BigInt);

impl Model for Post {
    type PK = PostId;
    const TABLE: &'static str = "posts";
    const PKCOL: Column = Column::new("id", SqlType::Text);
    const COLUMNS: &'static [Column] = &[
        Column::new("id", SqlType::Text),
        Column::new("user_id", SqlType::Text),
        Column::new("title", SqlType::Text),
        Column::new("content", SqlType::Text),
        POST_LIKES,
        Column::new("created_at", SqlType::Timestamp),
        Column::new("updated_at", SqlType::Timestamp),
    ];

    fn pk(&self) -> PostId {
        self.id
    }
    fn from_row(row: &Row) -> likes_core::Result<Self> {
        Ok(Post {
            id: row.get(0)?,
            user: row.get(1)?,
            title: row.get(2)?,
            content: row.get(3)?,
            likes: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }
    fn values(&self) -> Vec<SqlVal> {
        vec![
            self.id.to_sql(),
            self.user.to_sql(),
            self.title.to_sql(),
            self.content.to_sql(),
            self.likes.to_sql(),
            self.created_at.to_sql(),
            self.updated_at.to_sql(),
        ]
    }
}

/// One user's like of one post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Like {
    pub id: LikeId,
    pub user: UserId,
    pub post: PostId,
    pub created_at: DateTime<FixedOffset>,
    /// Calendar date of `created_at` in its own offset. Analytics group on it.
    pub created_on: NaiveDate,
    pub updated_at: DateTime<FixedOffset>,
}

impl Like {
    /// A new, not yet stored like made at `at`.
    pub fn new(user: UserId, post: PostId, at: DateTime<FixedOffset>) -> Self {
        Like {
            id: LikeId::new(),
            user,
            post,
            created_at: at,
            created_on: at.date_naive(),
            updated_at: at,
        }
    }
}

impl Model for Like {
    type PK = LikeId;
    const TABLE: &'static str = "likes";
    const PKCOL: Column = Column::new("id", SqlType::Text);
    const COLUMNS: &'static [Column] = &[
        Column::new("id", SqlType::Text),
        Column::new("user_id", SqlType::Text),
        Column::new("post_id", SqlType::Text),
        Column::new("created_at", SqlType::Timestamp),
        Column::new("created_on", SqlType::Date),
        Column::new("updated_at", SqlType::Timestamp),
    ];

    fn pk(&self) -> LikeId {
        self.id
    }
    fn from_row(row: &Row) -> likes_core::Result<Self> {
        Ok(Like {
            id: row.get(0)?,
            user: row.get(1)?,
            post: row.get(2)?,
            created_at: row.get(3)?,
            created_on: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
    fn values(&self) -> Vec<SqlVal> {
        vec![
            self.id.to_sql(),
            self.user.to_sql(),
            self.post.to_sql(),
            self.created_at.to_sql(),
            self.created_on.to_sql(),
            self.updated_at.to_sql(),
        ]
    }
}

fn id_column(name: &str) -> TableColumn {
    TableColumn::new(name, SqlType::Text)
}

fn timestamps(table: Table) -> Table {
    table
        .column(TableColumn::new("created_at", SqlType::Timestamp))
        .column(TableColumn::new("updated_at", SqlType::Timestamp))
}

/// The schema: users, posts and likes.
pub fn tables() -> Vec<Table> {
    let users = timestamps(
        Table::new(User::TABLE)
            .column(id_column("id").primary_key())
            .column(TableColumn::new("username", SqlType::Text).unique())
            .column(TableColumn::new("email", SqlType::Text).unique())
            .column(TableColumn::new("is_superuser", SqlType::Bool).default_value(false))
            .column(TableColumn::new("last_login", SqlType::Timestamp).nullable())
            .column(TableColumn::new("last_request", SqlType::Timestamp).nullable()),
    );
    let posts = timestamps(
        Table::new(Post::TABLE)
            .column(id_column("id").primary_key())
            .column(id_column("user_id").references(Reference::new(
                User::TABLE,
                "id",
                OnDelete::Cascade,
            )))
            .column(TableColumn::new("title", SqlType::Text))
            .column(TableColumn::new("content", SqlType::Text))
            .column(
                TableColumn::new("likes", SqlType::BigInt)
                    .default_value(0i64)
                    .check("likes >= 0"),
            ),
    );
    let likes = Table::new(Like::TABLE)
        .column(id_column("id").primary_key())
        .column(id_column("user_id").references(Reference::new(
            User::TABLE,
            "id",
            OnDelete::Cascade,
        )))
        .column(id_column("post_id").references(Reference::new(
            Post::TABLE,
            "id",
            OnDelete::Cascade,
        )))
        .column(TableColumn::new("created_at", SqlType::Timestamp))
        .column(TableColumn::new("created_on", SqlType::Date))
        .column(TableColumn::new("updated_at", SqlType::Timestamp))
        .unique_together(&["user_id", "post_id"]);
    vec![users, posts, likes]
}

/// Create the schema unless it already exists.
pub fn setup_schema(conn: &impl BackendConnection) -> likes_core::Result<()> {
    db::create_schema(conn, &tables())
}
