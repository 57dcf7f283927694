//! Abstract table definitions. Backends render them into DDL with
//! [`Backend::create_schema_sql`][crate::db::Backend::create_schema_sql].
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};

use crate::{SqlType, SqlVal};

/// What happens to referencing rows when the referenced row is deleted.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum OnDelete {
    /// Delete the referencing rows too.
    Cascade,
}

/// Foreign key from a column to another table's column.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Reference {
    table_name: String,
    column_name: String,
    on_delete: OnDelete,
}
impl Reference {
    /// Create new reference to a table and column.
    pub fn new(
        table_name: impl Into<String>,
        column_name: impl Into<String>,
        on_delete: OnDelete,
    ) -> Self {
        Reference {
            table_name: table_name.into(),
            column_name: column_name.into(),
            on_delete,
        }
    }
    /// Get table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }
    /// Get column name.
    pub fn column_name(&self) -> &str {
        &self.column_name
    }
    /// Get the delete behavior.
    pub fn on_delete(&self) -> OnDelete {
        self.on_delete
    }
}

/// Abstract representation of a database column schema.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TableColumn {
    name: String,
    sqltype: SqlType,
    nullable: bool,
    pk: bool,
    unique: bool,
    default: Option<SqlVal>,
    reference: Option<Reference>,
    check: Option<String>,
}
impl TableColumn {
    /// Simple column that is non-null, non-pk, non-unique with no default.
    pub fn new(name: impl Into<String>, sqltype: SqlType) -> Self {
        TableColumn {
            name: name.into(),
            sqltype,
            nullable: false,
            pk: false,
            unique: false,
            default: None,
            reference: None,
            check: None,
        }
    }
    /// Marks this column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.pk = true;
        self
    }
    /// Allows NULL values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
    /// Adds a single-column unique constraint.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
    /// Sets the default value.
    pub fn default_value(mut self, val: impl Into<SqlVal>) -> Self {
        self.default = Some(val.into());
        self
    }
    /// Sets the referenced table column.
    pub fn references(mut self, reference: Reference) -> Self {
        self.reference = Some(reference);
        self
    }
    /// Adds a CHECK constraint. The expression is backend SQL.
    pub fn check(mut self, expr: impl Into<String>) -> Self {
        self.check = Some(expr.into());
        self
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn sqltype(&self) -> SqlType {
        self.sqltype
    }
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
    pub fn is_unique(&self) -> bool {
        self.unique
    }
    pub fn is_pk(&self) -> bool {
        self.pk
    }
    pub fn default(&self) -> Option<&SqlVal> {
        self.default.as_ref()
    }
    /// Returns the column this column refers to, if any.
    pub fn reference(&self) -> Option<&Reference> {
        self.reference.as_ref()
    }
    pub fn check_expr(&self) -> Option<&str> {
        self.check.as_deref()
    }
}

/// Abstract representation of a database table schema.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<TableColumn>,
    /// Groups of columns whose combined values must be unique.
    pub unique_together: Vec<Vec<String>>,
}
impl Table {
    pub fn new(name: impl Into<String>) -> Table {
        Table {
            name: name.into(),
            columns: Vec::new(),
            unique_together: Vec::new(),
        }
    }
    /// Adds a column, replacing any existing column of the same name.
    pub fn column(mut self, col: TableColumn) -> Self {
        if let Some(existing) = self.columns.iter_mut().find(|c| c.name == col.name) {
            *existing = col;
        } else {
            self.columns.push(col);
        }
        self
    }
    /// Adds a multi-column unique constraint.
    pub fn unique_together(mut self, columns: &[&str]) -> Self {
        self.unique_together
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }
    pub fn get_column<'a>(&'a self, name: &str) -> Option<&'a TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
    pub fn pk(&self) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.is_pk())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_replaced_by_name() {
        let table = Table::new("t")
            .column(TableColumn::new("id", SqlType::Text).primary_key())
            .column(TableColumn::new("n", SqlType::Text))
            .column(TableColumn::new("n", SqlType::BigInt));
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.get_column("n").unwrap().sqltype(), SqlType::BigInt);
        assert_eq!(table.pk().unwrap().name(), "id");
    }
}
