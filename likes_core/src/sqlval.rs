//! Database values and conversions between them and Rust types.
#![allow(missing_docs)]

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{Error::CannotConvertSqlVal, Result, SqlType};

/// Format used to store calendar dates. Dates stored this way sort
/// lexically in calendar order.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A database value.
///
/// For conversion between `SqlVal` and other types, see [`FromSql`], [`IntoSql`], and [`ToSql`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlVal {
    Null,
    Bool(bool),
    BigInt(i64),
    Text(String),
    Date(NaiveDate),
    Timestamp(DateTime<FixedOffset>),
}
impl SqlVal {
    pub fn bool(&self) -> Result<bool> {
        match self {
            SqlVal::Bool(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::Bool, self.clone())),
        }
    }
    pub fn bigint(&self) -> Result<i64> {
        match self {
            SqlVal::BigInt(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::BigInt, self.clone())),
        }
    }
    pub fn text(&self) -> Result<&str> {
        match self {
            SqlVal::Text(val) => Ok(val),
            _ => Err(CannotConvertSqlVal(SqlType::Text, self.clone())),
        }
    }
    pub fn owned_text(self) -> Result<String> {
        match self {
            SqlVal::Text(val) => Ok(val),
            _ => Err(CannotConvertSqlVal(SqlType::Text, self.clone())),
        }
    }
    pub fn date(&self) -> Result<NaiveDate> {
        match self {
            SqlVal::Date(val) => Ok(*val),
            _ => Err(CannotConvertSqlVal(SqlType::Date, self.clone())),
        }
    }

    /// Tests if this sqlval is compatible with the given
    /// `SqlType`. There are no implicit type conversions.
    pub fn is_compatible(&self, ty: SqlType, null_allowed: bool) -> bool {
        match self {
            SqlVal::Null => null_allowed,
            SqlVal::Bool(_) => ty == SqlType::Bool,
            SqlVal::BigInt(_) => ty == SqlType::BigInt,
            SqlVal::Text(_) => ty == SqlType::Text,
            SqlVal::Date(_) => ty == SqlType::Date,
            SqlVal::Timestamp(_) => ty == SqlType::Timestamp,
        }
    }
}
impl fmt::Display for SqlVal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SqlVal::*;
        match &self {
            SqlVal::Null => f.write_str("NULL"),
            SqlVal::Bool(val) => val.fmt(f),
            BigInt(val) => val.fmt(f),
            Text(val) => val.fmt(f),
            Date(val) => val.format(DATE_FORMAT).fmt(f),
            Timestamp(val) => val.to_rfc3339().fmt(f),
        }
    }
}

/// Used to convert another type to a `SqlVal`.
///
/// Unlike [`IntoSql`][crate::IntoSql], the value is not consumed.
pub trait ToSql {
    fn to_sql(&self) -> SqlVal;
}

/// Used to convert another type to a `SqlVal`.
///
/// The value is consumed. For a non-consuming trait, see
/// [`ToSql`][crate::ToSql].
pub trait IntoSql {
    fn into_sql(self) -> SqlVal;
}

impl<T> From<T> for SqlVal
where
    T: IntoSql,
{
    fn from(val: T) -> Self {
        val.into_sql()
    }
}

/// Used to convert a `SqlVal` into another type.
///
/// The `SqlVal` is consumed.
pub trait FromSql {
    fn from_sql(val: SqlVal) -> Result<Self>
    where
        Self: Sized;
}

/// Type suitable for being a database column.
pub trait FieldType: ToSql + IntoSql + FromSql {
    const SQLTYPE: SqlType;
}

macro_rules! impl_basic_from_sql {
    ($prim:ty, $variant:ident, $sqltype:ident) => {
        impl FromSql for $prim {
            fn from_sql(val: SqlVal) -> Result<Self> {
                if let SqlVal::$variant(val) = val {
                    Ok(val as $prim)
                } else {
                    Err(crate::Error::CannotConvertSqlVal(SqlType::$sqltype, val))
                }
            }
        }
    };
}

macro_rules! impl_prim_sql {
    ($prim:ty, $variant:ident, $sqltype:ident) => {
        impl_basic_from_sql!($prim, $variant, $sqltype);
        impl IntoSql for $prim {
            fn into_sql(self) -> SqlVal {
                SqlVal::$variant(self.into())
            }
        }
        impl ToSql for $prim {
            fn to_sql(&self) -> SqlVal {
                self.clone().into_sql()
            }
        }
        impl FieldType for $prim {
            const SQLTYPE: SqlType = SqlType::$sqltype;
        }
    };
}

impl_prim_sql!(bool, Bool, Bool);
impl_prim_sql!(NaiveDate, Date, Date);
impl_prim_sql!(DateTime<FixedOffset>, Timestamp, Timestamp);

impl FromSql for i64 {
    fn from_sql(val: SqlVal) -> Result<Self> {
        val.bigint()
    }
}
impl IntoSql for i64 {
    fn into_sql(self) -> SqlVal {
        SqlVal::BigInt(self)
    }
}
impl ToSql for i64 {
    fn to_sql(&self) -> SqlVal {
        SqlVal::BigInt(*self)
    }
}
impl FieldType for i64 {
    const SQLTYPE: SqlType = SqlType::BigInt;
}

impl_basic_from_sql!(String, Text, Text);
impl ToSql for String {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text(self.clone())
    }
}
impl IntoSql for String {
    fn into_sql(self) -> SqlVal {
        SqlVal::Text(self)
    }
}
impl FieldType for String {
    const SQLTYPE: SqlType = SqlType::Text;
}

impl ToSql for &str {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text((*self).to_string())
    }
}
impl IntoSql for &str {
    fn into_sql(self) -> SqlVal {
        SqlVal::Text(self.to_string())
    }
}
impl ToSql for str {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text(self.to_string())
    }
}

impl<T> ToSql for Option<T>
where
    T: ToSql,
{
    fn to_sql(&self) -> SqlVal {
        match self {
            None => SqlVal::Null,
            Some(v) => v.to_sql(),
        }
    }
}
impl<T> IntoSql for Option<T>
where
    T: IntoSql,
{
    fn into_sql(self) -> SqlVal {
        match self {
            None => SqlVal::Null,
            Some(v) => v.into_sql(),
        }
    }
}
impl<T> FromSql for Option<T>
where
    T: FromSql,
{
    fn from_sql(val: SqlVal) -> Result<Self> {
        Ok(match val {
            SqlVal::Null => None,
            _ => Some(T::from_sql(val)?),
        })
    }
}
impl<T> FieldType for Option<T>
where
    T: FieldType,
{
    const SQLTYPE: SqlType = T::SQLTYPE;
}
