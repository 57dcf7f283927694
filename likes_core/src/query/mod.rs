//! Types to describe filters and aggregate queries.

#![allow(missing_docs)]

use std::borrow::Cow;

use crate::db::ConnectionMethods;
use crate::{Result, SqlType, SqlVal};

type TblName = Cow<'static, str>;

/// Abstract representation of a database expression.
#[derive(Clone, Debug)]
pub enum Expr {
    /// A value.
    Val(SqlVal),
}

/// Abstract representation of a boolean expression.
///
/// Column names may be qualified (`"posts.user_id"`) when the
/// expression is evaluated against a join.
#[derive(Clone, Debug)]
pub enum BoolExpr {
    True,
    Eq(&'static str, Expr),
    Le(&'static str, Expr),
    Ge(&'static str, Expr),
    AllOf(Vec<BoolExpr>),
}
impl BoolExpr {
    /// `col = val`
    pub fn eq(col: &'static str, val: impl Into<SqlVal>) -> Self {
        BoolExpr::Eq(col, Expr::Val(val.into()))
    }
    /// `col >= val`
    pub fn ge(col: &'static str, val: impl Into<SqlVal>) -> Self {
        BoolExpr::Ge(col, Expr::Val(val.into()))
    }
    /// `col <= val`
    pub fn le(col: &'static str, val: impl Into<SqlVal>) -> Self {
        BoolExpr::Le(col, Expr::Val(val.into()))
    }
    /// Conjunction of `exprs`. An empty list matches every row.
    pub fn all_of(mut exprs: Vec<BoolExpr>) -> Self {
        match exprs.len() {
            0 => BoolExpr::True,
            1 => exprs.remove(0),
            _ => BoolExpr::AllOf(exprs),
        }
    }
}

/// Represents the direction of a sort.
#[derive(Clone, Debug)]
pub enum OrderDirection {
    Descending,
}

/// Represents a sorting term (ORDER BY in SQL).
#[derive(Clone, Debug)]
pub struct Order {
    pub direction: OrderDirection,
    pub column: &'static str,
}
impl Order {
    pub fn desc(column: &'static str) -> Self {
        Order {
            direction: OrderDirection::Descending,
            column,
        }
    }
}

#[derive(Clone, Debug)]
pub enum Join {
    /// Inner join `join_table` where `col1` is equal to
    /// `col2`
    Inner {
        join_table: &'static str,
        col1: Column,
        col2: Column,
    },
}

#[derive(Clone, Debug)]
pub struct Column {
    table: TblName,
    name: &'static str,
}
impl Column {
    pub fn new(table: &'static str, name: &'static str) -> Self {
        Column {
            table: Cow::Borrowed(table),
            name,
        }
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Counts the rows of a table (optionally joined and filtered), grouped
/// by the value of a single column.
///
/// Results are ordered ascending by the group value. Groups with no
/// matching rows do not appear at all.
#[derive(Clone, Debug)]
pub struct GroupCount {
    table: TblName,
    joins: Vec<Join>,
    group: Column,
    group_type: SqlType,
    filter: Option<BoolExpr>,
}
impl GroupCount {
    /// Group the rows of `table` by `group`, whose values have type `group_type`.
    pub fn new(table: &'static str, group: Column, group_type: SqlType) -> Self {
        GroupCount {
            table: Cow::Borrowed(table),
            joins: Vec::new(),
            group,
            group_type,
            filter: None,
        }
    }

    /// Adds a join. Returns `self` as this method is expected to be chained.
    pub fn join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    /// Restricts the counted rows to those for which `expr` is true.
    /// Returns `self` as this method is expected to be chained.
    pub fn filter(mut self, expr: BoolExpr) -> Self {
        self.filter = Some(expr);
        self
    }

    /// Executes the aggregate against `conn`.
    pub fn load(self, conn: &(impl ConnectionMethods + ?Sized)) -> Result<Vec<(SqlVal, i64)>> {
        conn.count_grouped(
            &self.table,
            &self.joins,
            &self.group,
            self.group_type,
            self.filter,
        )
    }
}
