//! R2D2 support. Each pooled connection is an ordinary [`Connection`],
//! so every worker thread of a service can hold its own.

pub use r2d2::ManageConnection;

use std::ops::Deref;

use crate::db::{BackendConnection, Column, Connection, ConnectionMethods, ConnectionSpec};
use crate::db::QueryResult;
use crate::query::{BoolExpr, Join, Order};
use crate::{query, Result, SqlType, SqlVal};

/// Implements [`r2d2::ManageConnection`] for connections opened from a
/// [`ConnectionSpec`].
#[derive(Clone, Debug)]
pub struct ConnectionManager {
    spec: ConnectionSpec,
}
impl ConnectionManager {
    /// Create a manager which opens connections described by `spec`.
    pub fn new(spec: ConnectionSpec) -> Self {
        ConnectionManager { spec }
    }
}

impl ManageConnection for ConnectionManager {
    type Connection = Connection;
    type Error = crate::Error;

    fn connect(&self) -> Result<Self::Connection> {
        crate::db::connect(&self.spec)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<()> {
        conn.execute("SELECT 1")
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.is_closed()
    }
}

impl ConnectionMethods for r2d2::PooledConnection<ConnectionManager> {
    fn execute(&self, sql: &str) -> Result<()> {
        self.deref().execute(sql)
    }
    fn query(
        &self,
        table: &str,
        columns: &[Column],
        expr: Option<BoolExpr>,
        limit: Option<i32>,
        order: Option<&[Order]>,
    ) -> Result<QueryResult> {
        self.deref().query(table, columns, expr, limit, order)
    }
    fn insert_only(&self, table: &str, columns: &[Column], values: &[SqlVal]) -> Result<()> {
        self.deref().insert_only(table, columns, values)
    }
    fn update(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        columns: &[Column],
        values: &[SqlVal],
    ) -> Result<usize> {
        self.deref().update(table, pkcol, pk, columns, values)
    }
    fn update_relative(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        column: &Column,
        delta: i64,
    ) -> Result<usize> {
        self.deref()
            .update_relative(table, pkcol, pk, column, delta)
    }
    fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize> {
        self.deref().delete_where(table, expr)
    }
    fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64> {
        self.deref().count(table, expr)
    }
    fn count_grouped(
        &self,
        table: &str,
        joins: &[Join],
        group: &query::Column,
        group_type: SqlType,
        expr: Option<BoolExpr>,
    ) -> Result<Vec<(SqlVal, i64)>> {
        self.deref()
            .count_grouped(table, joins, group, group_type, expr)
    }
    fn has_table(&self, table: &str) -> Result<bool> {
        self.deref().has_table(table)
    }
}
