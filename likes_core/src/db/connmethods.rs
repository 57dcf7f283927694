use crate::query::{BoolExpr, Join, Order};
use crate::{query, Error, FromSql, Result, SqlType, SqlVal};

/// Methods available on a database object such as a connection or a
/// transaction.
///
/// Every method is a single round trip to the store. Write methods
/// report how many rows they touched instead of failing when nothing
/// matched, so callers decide whether "nothing happened" is an error.
pub trait ConnectionMethods {
    /// Execute raw SQL. Used for schema creation and health checks.
    fn execute(&self, sql: &str) -> Result<()>;
    /// Load `columns` of the rows of `table` matching `expr`.
    fn query(
        &self,
        table: &str,
        columns: &[Column],
        expr: Option<BoolExpr>,
        limit: Option<i32>,
        order: Option<&[Order]>,
    ) -> Result<QueryResult>;
    /// Insert a single row. A uniqueness violation is reported as
    /// [`Error::Conflict`] and leaves the store unchanged.
    fn insert_only(&self, table: &str, columns: &[Column], values: &[SqlVal]) -> Result<()>;
    /// Set `columns` to `values` on the row identified by `pk`.
    /// Returns the number of rows updated.
    fn update(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        columns: &[Column],
        values: &[SqlVal],
    ) -> Result<usize>;
    /// Atomically add `delta` to `column` on the row identified by
    /// `pk`. The new value is computed by the store, never from a value
    /// previously read by the caller. Returns the number of rows
    /// updated, which is zero when the row does not exist.
    fn update_relative(
        &self,
        table: &str,
        pkcol: &Column,
        pk: SqlVal,
        column: &Column,
        delta: i64,
    ) -> Result<usize>;
    /// Delete every row of `table` matching `expr`. Returns the number
    /// of rows deleted.
    fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize>;
    /// Count the rows of `table` matching `expr`.
    fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64>;
    /// Count the rows of `table` (joined with `joins`) matching `expr`,
    /// grouped by `group`. Results are ascending by group value.
    fn count_grouped(
        &self,
        table: &str,
        joins: &[Join],
        group: &query::Column,
        group_type: SqlType,
        expr: Option<BoolExpr>,
    ) -> Result<Vec<(SqlVal, i64)>>;
    /// Tests if a table exists in the database.
    fn has_table(&self, table: &str) -> Result<bool>;
}

/// Represents a database column. Most users do not need to use this
/// directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Column {
    name: &'static str,
    ty: SqlType,
}
impl Column {
    /// Create a new column with `name` and type `ty`.
    pub const fn new(name: &'static str, ty: SqlType) -> Self {
        Column { name, ty }
    }
    /// Name of the column.
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// Type of the column.
    pub fn ty(&self) -> SqlType {
        self.ty
    }
}

/// A row loaded from the database, one value per requested column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    values: Vec<SqlVal>,
}
impl Row {
    /// Wrap the values of a row.
    pub fn new(values: Vec<SqlVal>) -> Self {
        Row { values }
    }
    /// Get the value at `idx`, converted to `T`.
    pub fn get<T: FromSql>(&self, idx: usize) -> Result<T> {
        let val = self
            .values
            .get(idx)
            .cloned()
            .ok_or_else(|| Error::BoundsError(format!("column {idx} of {}", self.values.len())))?;
        T::from_sql(val)
    }
    /// Number of values in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }
    /// Whether the row has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rows returned by [`ConnectionMethods::query`].
pub type QueryResult = Vec<Row>;
