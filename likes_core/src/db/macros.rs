/// Implements [`ConnectionMethods`][crate::db::ConnectionMethods] for a
/// type by delegating every call to the value returned by its
/// `wrapped_connection_methods` method.
#[macro_export]
macro_rules! connection_method_wrapper {
    ($ty:path) => {
        impl ConnectionMethods for $ty {
            fn execute(&self, sql: &str) -> Result<()> {
                ConnectionMethods::execute(self.wrapped_connection_methods()?, sql)
            }
            fn query(
                &self,
                table: &str,
                columns: &[Column],
                expr: Option<BoolExpr>,
                limit: Option<i32>,
                order: Option<&[Order]>,
            ) -> Result<QueryResult> {
                self.wrapped_connection_methods()?
                    .query(table, columns, expr, limit, order)
            }
            fn insert_only(
                &self,
                table: &str,
                columns: &[Column],
                values: &[SqlVal],
            ) -> Result<()> {
                self.wrapped_connection_methods()?
                    .insert_only(table, columns, values)
            }
            fn update(
                &self,
                table: &str,
                pkcol: &Column,
                pk: SqlVal,
                columns: &[Column],
                values: &[SqlVal],
            ) -> Result<usize> {
                self.wrapped_connection_methods()?
                    .update(table, pkcol, pk, columns, values)
            }
            fn update_relative(
                &self,
                table: &str,
                pkcol: &Column,
                pk: SqlVal,
                column: &Column,
                delta: i64,
            ) -> Result<usize> {
                self.wrapped_connection_methods()?
                    .update_relative(table, pkcol, pk, column, delta)
            }
            fn delete_where(&self, table: &str, expr: BoolExpr) -> Result<usize> {
                self.wrapped_connection_methods()?.delete_where(table, expr)
            }
            fn count(&self, table: &str, expr: Option<BoolExpr>) -> Result<i64> {
                self.wrapped_connection_methods()?.count(table, expr)
            }
            fn count_grouped(
                &self,
                table: &str,
                joins: &[Join],
                group: &query::Column,
                group_type: SqlType,
                expr: Option<BoolExpr>,
            ) -> Result<Vec<(SqlVal, i64)>> {
                self.wrapped_connection_methods()?
                    .count_grouped(table, joins, group, group_type, expr)
            }
            fn has_table(&self, table: &str) -> Result<bool> {
                self.wrapped_connection_methods()?.has_table(table)
            }
        }
    };
}
