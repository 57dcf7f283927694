//! Uuid support

use uuid::Uuid;

use crate::{Error::CannotConvertSqlVal, FieldType, FromSql, IntoSql, Result, SqlType, SqlVal, ToSql};

// Stored as hyphenated text.
impl ToSql for Uuid {
    fn to_sql(&self) -> SqlVal {
        SqlVal::Text(self.hyphenated().to_string())
    }
}
impl IntoSql for Uuid {
    fn into_sql(self) -> SqlVal {
        self.to_sql()
    }
}
impl FromSql for Uuid {
    fn from_sql(val: SqlVal) -> Result<Self> {
        if let SqlVal::Text(text) = &val {
            if let Ok(uuid) = Uuid::parse_str(text) {
                return Ok(uuid);
            }
        }
        Err(CannotConvertSqlVal(SqlType::Text, val))
    }
}

impl FieldType for Uuid {
    const SQLTYPE: SqlType = SqlType::Text;
}
