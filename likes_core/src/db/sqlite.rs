//! SQLite database backend
use std::borrow::Cow;
use std::ops::Deref;
use std::path::Path;
#[cfg(feature = "log")]
use std::sync::Once;
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use rusqlite::{ErrorCode, TransactionBehavior};

use super::{helper, Backend, Column, QueryResult, Row};
use super::{BackendConnection, BackendTransaction, Connection, ConnectionMethods, Transaction};
use crate::query::{BoolExpr, Join, Order};
use crate::schema::{Table, TableColumn};
use crate::sqlval::DATE_FORMAT;
use crate::{debug, query, Error, Result, SqlType, SqlVal};

/// The name of the sqlite backend.
pub const BACKEND_NAME: &str = "sqlite";

/// How long a connection waits for another writer to release the
/// database before reporting it busy.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[cfg(feature = "log")]
fn log_callback(error_code: std::ffi::c_int, message: &str) {
    match error_code {
        rusqlite::ffi::SQLITE_NOTICE => {
            #[cfg(feature = "debug")]
            log::trace!("{}", message)
        }
        rusqlite::ffi::SQLITE_OK
        | rusqlite::ffi::SQLITE_DONE
        | rusqlite::ffi::SQLITE_NOTICE_RECOVER_WAL
        | rusqlite::ffi::SQLITE_NOTICE_RECOVER_ROLLBACK => log::info!("{}", message),
        rusqlite::ffi::SQLITE_WARNING | rusqlite::ffi::SQLITE_WARNING_AUTOINDEX => {
            log::warn!("{}", message)
        }
        // Lock contention is expected under concurrent writers and is
        // retried by the busy handler.
        rusqlite::ffi::SQLITE_BUSY | rusqlite::ffi::SQLITE_LOCKED => {
            log::debug!("{error_code} {}", message)
        }
        _ => log::error!("{error_code} {}", message),
    }
}

/// SQLite [`Backend`] implementation.
#[derive(Debug, Default, Clone)]
pub struct SQLiteBackend;
impl SQLiteBackend {
    /// Create the backend.
    pub fn new() -> SQLiteBackend {
        SQLiteBackend {}
    }
}
impl SQLiteBackend {
    /// Open a connection with foreign keys enforced and a busy timeout
    /// set, so concurrent writers queue instead of failing.
    pub fn connect(&self, path: &str) -> Result<SQLiteConnection> {
        let connection = SQLiteConnection::open(Path::new(path))?;
        connection.conn.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute("PRAGMA foreign_keys = ON")?;
        // Readers do not block the writer in WAL mode. In-memory
        // databases report "memory" and ignore the request.
        let mode: String =
            connection
                .conn
                .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
        debug!("sqlite journal mode {mode}");
        Ok(connection)
    }
}

impl Backend for SQLiteBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn create_schema_sql(&self, tables: &[Table]) -> Result<String> {
        let stmts = tables
            .iter()
            .map(|t| helper::sql_create_table(t, col_sqltype))
            .collect::<Result<Vec<String>>>()?;
        Ok(stmts.join("\n"))
    }

    fn connect(&self, path: &str) -> Result<Connection> {
        Ok(Connection {
            conn: Box::new(self.connect(path)?),
        })
    }
}

/// SQLite database connection.
#[derive(Debug)]
pub struct SQLiteConnection {
    conn: rusqlite::Connection,
}
impl SQLiteConnection {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        #[cfg(feature = "log")]
        static INIT_SQLITE_LOGGING: Once = Once::new();

        #[cfg(feature = "log")]
        INIT_SQLITE_LOGGING.call_once(|| {
            _ = unsafe { rusqlite::trace::config_log(Some(log_callback)) };
        });

        rusqlite::Connection::open(path)
            .map(|conn| SQLiteConnection { conn })
            .map_err(|e| e.into())
    }

    // For use with connection_method_wrapper macro
    #[allow(clippy::unnecessary_wraps)]
    fn wrapped_connection_methods(&self) -> Result<&rusqlite::Connection> {
        Ok(&self.conn)
    }
}
crate::connection_method_wrapper!(SQLiteConnection);

impl BackendConnection for SQLiteConnection {
    fn transaction(&mut self) -> Result<Transaction<'_>> {
        // IMMEDIATE takes the write lock up front. A deferred
        // transaction which reads first and writes later can fail with
        // SQLITE_BUSY at the write without the busy handler retrying.
        let trans: rusqlite::Transaction<'_> = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let trans = Box::new(SqliteTransaction::new(trans));
        Ok(Transaction::new(trans))
    }
    fn backend(&self) -> Box<dyn Backend> {
        Box::new(SQLiteBackend {})
    }
    fn backend_name(&self) -> &'static str {
        BACKEND_NAME
    }
    fn is_closed(&self) -> bool {
        false
    }
}

impl ConnectionMethods for rusqlite::Connection {
    fn execute(&self, sql: &str) -> Result<()> {
        debug!("execute sql {}", sql);
        self.execute_batch(sql)?;
        Ok(())
    }

    fn query(
        &self,
        table: &str,
        columns: &[Column],
        expr: Option<BoolExpr>,
        limit: Option<i32>,
        order: Option<&[Order]>,
    ) -> Result<QueryResult> {
        let mut sqlquery = String::new();
        helper::sql_select(columns, table, &mut sqlquery);
        let mut values: Vec<SqlVal> = Vec::new();
        helper::sql_where(
            expr,
            &mut values,
            &mut SQLitePlaceholderSource::new(),
            &mut sqlquery,
        );
        if let Some(order) = order {
            helper::sql_order(order, &mut sqlquery)
        }
        if let Some(limit) = limit {
            helper::sql_limit(limit, &mut sqlquery)
        }

        debug!("query sql {}", sqlquery);
        #[cfg(feature = "debug")]
        debug!("values {:?}", values);

        let mut stmt = self.prepare(&sqlquery)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let vals = columns
                .iter()
                .enumerate()
                .map(|(i, col)| sql_val_from_rusqlite(row.get_ref(i)?, col.ty(), col.name()))
                .collect::<Result<Vec<SqlVal>>>()?;
            result.push(Row::new(vals));
        }
        Ok(result)
    }

    fn insert_only(&self, table: &str, columns: &[Column], values: &[SqlVal]) -> Result<()> {
        let mut sql = String::new();
        helper::sql_insert_with_placeholders(
            table,
            columns,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("insert sql {}", sql);
        #[cfg(feature = "debug")]
        debug!("values {:?}", values);
        self.execute(&sql, rusqlite::params_from_iter(values))
            .map_err(constraint_error)?;
        Ok(())
    }

    fn update(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        columns: &[Column],
        values: &[SqlVal],
    ) -> Result<usize> {
        let mut sql = String::new();
        helper::sql_update_with_placeholders(
            table,
            pkcol,
            columns,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        let placeholder_values = [values, &[pk]].concat();
        debug!("update sql {}", sql);
        #[cfg(feature = "debug")]
        debug!("placeholders {:?}", placeholder_values);
        self.execute(&sql, rusqlite::params_from_iter(placeholder_values))
            .map_err(constraint_error)
    }

    fn update_relative(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        column: &Column,
        delta: i64,
    ) -> Result<usize> {
        let mut sql = String::new();
        helper::sql_update_relative(
            table,
            pkcol,
            column,
            delta,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("update sql {}", sql);
        self.execute(&sql, rusqlite::params_from_iter([pk]))
            .map_err(constraint_error)
    }

    fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize> {
        let mut sql = format!("DELETE FROM {}", helper::quote_reserved_word(table));
        let mut values: Vec<SqlVal> = Vec::new();
        helper::sql_where(
            Some(expr),
            &mut values,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("delete where sql {}", sql);
        #[cfg(feature = "debug")]
        debug!("placeholders {:?}", values);
        self.execute(&sql, rusqlite::params_from_iter(values))
            .map_err(constraint_error)
    }

    fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", helper::quote_reserved_word(table));
        let mut values: Vec<SqlVal> = Vec::new();
        helper::sql_where(
            expr,
            &mut values,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("count sql {}", sql);
        let n: i64 = self.query_row(&sql, rusqlite::params_from_iter(values), |row| row.get(0))?;
        Ok(n)
    }

    fn count_grouped(
        &self,
        table: &str,
        joins: &[Join],
        group: &query::Column,
        group_type: SqlType,
        expr: Option<BoolExpr>,
    ) -> Result<Vec<(SqlVal, i64)>> {
        let mut sql = String::new();
        let mut values: Vec<SqlVal> = Vec::new();
        helper::sql_group_count(
            table,
            joins,
            group,
            expr,
            &mut values,
            &mut SQLitePlaceholderSource::new(),
            &mut sql,
        );
        debug!("group count sql {}", sql);
        #[cfg(feature = "debug")]
        debug!("placeholders {:?}", values);

        let mut stmt = self.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let key = sql_val_from_rusqlite(row.get_ref(0)?, group_type, group.name())?;
            let n: i64 = row.get(1)?;
            result.push((key, n));
        }
        Ok(result)
    }

    fn has_table(&self, table: &str) -> Result<bool> {
        let mut stmt =
            self.prepare("SELECT name FROM sqlite_master WHERE type='table' AND name=?;")?;
        let mut rows = stmt.query([table])?;
        Ok(rows.next()?.is_some())
    }
}

#[derive(Debug)]
struct SqliteTransaction<'c> {
    trans: Option<rusqlite::Transaction<'c>>,
}
impl<'c> SqliteTransaction<'c> {
    fn new(trans: rusqlite::Transaction<'c>) -> Self {
        SqliteTransaction { trans: Some(trans) }
    }
    fn get(&self) -> Result<&rusqlite::Transaction<'c>> {
        match &self.trans {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans),
        }
    }
    fn wrapped_connection_methods(&self) -> Result<&rusqlite::Connection> {
        Ok(self.get()?.deref())
    }
    fn already_consumed() -> Error {
        Error::Internal("transaction has already been consumed".to_string())
    }
}
crate::connection_method_wrapper!(SqliteTransaction<'_>);

impl<'c> BackendTransaction<'c> for SqliteTransaction<'c> {
    fn commit(&mut self) -> Result<()> {
        match self.trans.take() {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans.commit()?),
        }
    }
    fn rollback(&mut self) -> Result<()> {
        match self.trans.take() {
            None => Err(Self::already_consumed()),
            Some(trans) => Ok(trans.rollback()?),
        }
    }
    // Workaround for https://github.com/rust-lang/rfcs/issues/2765
    fn connection_methods(&self) -> &dyn ConnectionMethods {
        self
    }
}

/// Sorts constraint failures into uniqueness conflicts, which callers
/// treat as an expected outcome, and every other violation.
fn constraint_error(e: rusqlite::Error) -> Error {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg) if err.code == ErrorCode::ConstraintViolation => {
            let msg = msg.clone().unwrap_or_else(|| err.to_string());
            match err.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => Error::Conflict(msg),
                _ => Error::Constraint(msg),
            }
        }
        _ => e.into(),
    }
}

impl rusqlite::ToSql for SqlVal {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput::Borrowed, ToSqlOutput::Owned, Value, ValueRef};
        Ok(match self {
            SqlVal::Bool(b) => Owned(Value::Integer(*b as i64)),
            SqlVal::BigInt(i) => Owned(Value::Integer(*i)),
            SqlVal::Text(t) => Borrowed(ValueRef::Text(t.as_bytes())),
            SqlVal::Date(d) => Owned(Value::Text(d.format(DATE_FORMAT).to_string())),
            SqlVal::Timestamp(ts) => Owned(Value::Text(ts.to_rfc3339())),
            SqlVal::Null => Owned(Value::Null),
        })
    }
}

fn sql_val_from_rusqlite(
    val: rusqlite::types::ValueRef<'_>,
    ty: SqlType,
    col: &str,
) -> Result<SqlVal> {
    if matches!(val, rusqlite::types::ValueRef::Null) {
        return Ok(SqlVal::Null);
    }
    let mismatch = |e: rusqlite::types::FromSqlError| Error::SqlResultTypeMismatch {
        col: col.to_string(),
        detail: format!("expected {ty}: {e}"),
    };
    Ok(match ty {
        SqlType::Bool => SqlVal::Bool(val.as_i64().map_err(mismatch)? != 0),
        SqlType::BigInt => SqlVal::BigInt(val.as_i64().map_err(mismatch)?),
        SqlType::Text => SqlVal::Text(val.as_str().map_err(mismatch)?.to_string()),
        SqlType::Date => SqlVal::Date(NaiveDate::parse_from_str(
            val.as_str().map_err(mismatch)?,
            DATE_FORMAT,
        )?),
        SqlType::Timestamp => {
            SqlVal::Timestamp(DateTime::parse_from_rfc3339(val.as_str().map_err(mismatch)?)?)
        }
    })
}

fn col_sqltype(col: &TableColumn) -> Cow<'static, str> {
    Cow::Borrowed(sqltype(col.sqltype()))
}

fn sqltype(ty: SqlType) -> &'static str {
    match ty {
        SqlType::Bool => "INTEGER",
        SqlType::BigInt => "INTEGER",
        SqlType::Text => "TEXT",
        SqlType::Date => "TEXT",
        SqlType::Timestamp => "TEXT",
    }
}

#[derive(Debug)]
struct SQLitePlaceholderSource;
impl SQLitePlaceholderSource {
    fn new() -> Self {
        SQLitePlaceholderSource {}
    }
}
impl helper::PlaceholderSource for SQLitePlaceholderSource {
    fn next_placeholder(&mut self) -> Cow<'_, str> {
        // sqlite placeholder is always a question mark.
        Cow::Borrowed("?")
    }
}
