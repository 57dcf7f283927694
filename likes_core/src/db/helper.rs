//! SQL text builders shared by backends. Values never appear inline in
//! the generated text (integers excepted); they are collected into a
//! parameter list and referenced through placeholders.
// may occur if no backends are selected
#![allow(unused)]

use std::borrow::Cow;

use super::Column;
use crate::query::{BoolExpr, Expr, Join, Order, OrderDirection};
use crate::schema::{OnDelete, Table, TableColumn};
use crate::{query, Error, Result, SqlVal};

pub trait PlaceholderSource {
    fn next_placeholder(&mut self) -> Cow<'_, str>;
}

/// Quotes the `word` if it is a reserved word.
pub fn quote_reserved_word(word: &str) -> Cow<'_, str> {
    if sqlparser::keywords::ALL_KEYWORDS.contains(&word.to_uppercase().as_str()) {
        format!("\"{word}\"").into()
    } else {
        word.into()
    }
}

/// Quotes each dot-separated part of a possibly qualified column name.
fn quote_column_path(path: &str) -> String {
    path.split('.')
        .map(quote_reserved_word)
        .collect::<Vec<_>>()
        .join(".")
}

/// Appends to `w` the SQL for `expr`. Values contained in `expr` are
/// rendered as placeholders and the actual values are pushed to `values`.
pub fn sql_for_expr<P>(expr: Expr, values: &mut Vec<SqlVal>, pls: &mut P, w: &mut String)
where
    P: PlaceholderSource,
{
    match expr {
        Expr::Val(v) => match v {
            SqlVal::BigInt(i) => w.push_str(&i.to_string()),
            _ => {
                values.push(v);
                w.push_str(&pls.next_placeholder());
            }
        },
    }
}

fn sql_for_condition<P>(cond: BoolExpr, values: &mut Vec<SqlVal>, pls: &mut P, w: &mut String)
where
    P: PlaceholderSource,
{
    use BoolExpr::*;
    match cond {
        True => w.push_str("1 = 1"),
        Eq(col, Expr::Val(SqlVal::Null)) => {
            w.push_str(&format!("{} IS NULL", quote_column_path(col)))
        }
        Eq(col, ex) => sql_compare(col, "=", ex, values, pls, w),
        Le(col, ex) => sql_compare(col, "<=", ex, values, pls, w),
        Ge(col, ex) => sql_compare(col, ">=", ex, values, pls, w),
        AllOf(conds) => {
            let mut sep = "";
            for cond in conds {
                w.push_str(sep);
                w.push('(');
                sql_for_condition(cond, values, pls, w);
                w.push(')');
                sep = " AND ";
            }
            if sep.is_empty() {
                w.push_str("1 = 1");
            }
        }
    }
}

fn sql_compare<P: PlaceholderSource>(
    col: &str,
    op: &str,
    ex: Expr,
    values: &mut Vec<SqlVal>,
    pls: &mut P,
    w: &mut String,
) {
    w.push_str(&format!("{} {op} ", quote_column_path(col)));
    sql_for_expr(ex, values, pls, w);
}

/// Appends ` WHERE <expr>` to `w` if there is an expression.
pub fn sql_where<P: PlaceholderSource>(
    expr: Option<BoolExpr>,
    values: &mut Vec<SqlVal>,
    pls: &mut P,
    w: &mut String,
) {
    if let Some(expr) = expr {
        w.push_str(" WHERE ");
        sql_for_condition(expr, values, pls, w);
    }
}

pub fn sql_select(columns: &[Column], table: &str, w: &mut String) {
    w.push_str("SELECT ");
    list_columns(columns, w);
    w.push_str(&format!(" FROM {}", quote_reserved_word(table)));
}

pub fn sql_insert_with_placeholders(
    table: &str,
    columns: &[Column],
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    w.push_str(&format!("INSERT INTO {} ", quote_reserved_word(table)));
    if columns.is_empty() {
        w.push_str("DEFAULT VALUES");
        return;
    }
    w.push('(');
    list_columns(columns, w);
    w.push_str(") VALUES (");
    let mut sep = "";
    for _ in columns {
        w.push_str(sep);
        w.push_str(&pls.next_placeholder());
        sep = ", ";
    }
    w.push(')');
}

/// Appends to `w` the SQL of an UPDATE to `table` of `columns` using values in `pls`,
/// for the row uniquely identified by `pkcol`.
pub fn sql_update_with_placeholders(
    table: &str,
    pkcol: &Column,
    columns: &[Column],
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    w.push_str(&format!("UPDATE {} SET ", quote_reserved_word(table)));
    let mut sep = "";
    for c in columns {
        w.push_str(&format!(
            "{sep}{} = {}",
            quote_reserved_word(c.name()),
            pls.next_placeholder()
        ));
        sep = ", ";
    }
    w.push_str(&format!(
        " WHERE {} = {}",
        quote_reserved_word(pkcol.name()),
        pls.next_placeholder()
    ));
}

/// Appends to `w` an UPDATE which adds `delta` to `column` in place,
/// for the row uniquely identified by `pkcol`.
pub fn sql_update_relative(
    table: &str,
    pkcol: &Column,
    column: &Column,
    delta: i64,
    pls: &mut impl PlaceholderSource,
    w: &mut String,
) {
    let col = quote_reserved_word(column.name());
    let op = if delta < 0 { '-' } else { '+' };
    w.push_str(&format!(
        "UPDATE {} SET {col} = {col} {op} {} WHERE {} = {}",
        quote_reserved_word(table),
        delta.unsigned_abs(),
        quote_reserved_word(pkcol.name()),
        pls.next_placeholder()
    ));
}

/// Appends to `w` a grouped count: one row per distinct value of
/// `group`, with the number of matching rows, ascending by value.
pub fn sql_group_count<P: PlaceholderSource>(
    table: &str,
    joins: &[Join],
    group: &query::Column,
    expr: Option<BoolExpr>,
    values: &mut Vec<SqlVal>,
    pls: &mut P,
    w: &mut String,
) {
    w.push_str("SELECT ");
    sql_column(group, w);
    w.push_str(&format!(", COUNT(*) FROM {}", quote_reserved_word(table)));
    sql_joins(joins, w);
    sql_where(expr, values, pls, w);
    w.push_str(" GROUP BY ");
    sql_column(group, w);
    w.push_str(" ORDER BY ");
    sql_column(group, w);
    w.push_str(" ASC");
}

pub fn sql_limit(limit: i32, w: &mut String) {
    w.push_str(&format!(" LIMIT {limit}"));
}

/// Appends to `w` the SQL of the list of column `order`.
pub fn sql_order(order: &[Order], w: &mut String) {
    if order.is_empty() {
        return;
    }
    w.push_str(" ORDER BY ");
    let mut sep = "";
    for o in order {
        let sql_dir = match o.direction {
            OrderDirection::Descending => "DESC",
        };
        w.push_str(&format!("{sep}{} {sql_dir}", quote_column_path(o.column)));
        sep = ", ";
    }
}

/// Appends to `w` the SQL of the list of `columns`.
pub fn list_columns(columns: &[Column], w: &mut String) {
    w.push_str(
        &columns
            .iter()
            .map(|c| quote_reserved_word(c.name()))
            .collect::<Vec<Cow<str>>>()
            .join(", "),
    );
}

fn sql_joins(joins: &[Join], w: &mut String) {
    for join in joins {
        match join {
            Join::Inner {
                join_table,
                col1,
                col2,
            } => {
                // INNER JOIN <join_table> ON <col1> = <col2>
                w.push_str(&format!(
                    " INNER JOIN {} ON ",
                    quote_reserved_word(join_table)
                ));
                sql_column(col1, w);
                w.push_str(" = ");
                sql_column(col2, w);
            }
        }
    }
}

fn sql_column(col: &query::Column, w: &mut String) {
    w.push_str(&format!(
        "{}.{}",
        quote_reserved_word(col.table()),
        quote_reserved_word(col.name())
    ));
}

/// Renders `val` as an SQL literal, for use in DDL where placeholders
/// are not available.
pub fn sql_literal_value(val: &SqlVal) -> String {
    match val {
        SqlVal::Null => "NULL".to_string(),
        SqlVal::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        SqlVal::BigInt(i) => i.to_string(),
        SqlVal::Text(_) | SqlVal::Date(_) | SqlVal::Timestamp(_) => {
            format!("'{}'", val.to_string().replace('\'', "''"))
        }
    }
}

/// Renders `CREATE TABLE IF NOT EXISTS` for `table`, using `col_type`
/// to name each column's backend type.
pub fn sql_create_table(
    table: &Table,
    col_type: impl Fn(&TableColumn) -> Cow<'static, str>,
) -> Result<String> {
    if table.columns.is_empty() {
        return Err(Error::Internal(format!("table {} has no columns", table.name)));
    }
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|col| column_definition(col, &col_type))
        .collect();
    for group in &table.unique_together {
        for name in group {
            if table.get_column(name).is_none() {
                return Err(Error::Internal(format!(
                    "unique constraint names unknown column {}.{name}",
                    table.name
                )));
            }
        }
        defs.push(format!(
            "UNIQUE ({})",
            group
                .iter()
                .map(|c| quote_reserved_word(c))
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
        quote_reserved_word(&table.name),
        defs.join(",\n")
    ))
}

fn column_definition(
    col: &TableColumn,
    col_type: &impl Fn(&TableColumn) -> Cow<'static, str>,
) -> String {
    let mut def = format!("{} {}", quote_reserved_word(col.name()), col_type(col));
    if col.is_pk() {
        def.push_str(" PRIMARY KEY");
    }
    if !col.is_nullable() {
        def.push_str(" NOT NULL");
    }
    if col.is_unique() {
        def.push_str(" UNIQUE");
    }
    if let Some(val) = col.default() {
        def.push_str(&format!(" DEFAULT {}", sql_literal_value(val)));
    }
    if let Some(check) = col.check_expr() {
        def.push_str(&format!(" CHECK ({check})"));
    }
    if let Some(reference) = col.reference() {
        let on_delete = match reference.on_delete() {
            OnDelete::Cascade => "CASCADE",
        };
        def.push_str(&format!(
            " REFERENCES {}({}) ON DELETE {on_delete}",
            quote_reserved_word(reference.table_name()),
            quote_reserved_word(reference.column_name())
        ));
    }
    def
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::BoolExpr;
    use crate::schema::Reference;
    use crate::SqlType;

    struct Question;
    impl PlaceholderSource for Question {
        fn next_placeholder(&mut self) -> Cow<'_, str> {
            Cow::Borrowed("?")
        }
    }

    #[test]
    fn reserved_words_quoted() {
        assert_eq!(quote_reserved_word("date"), "\"date\"");
        assert_eq!(quote_reserved_word("likes"), "likes");
    }

    #[test]
    fn expr_values_become_placeholders() {
        let mut values = Vec::new();
        let mut sql = String::new();
        let expr = BoolExpr::all_of(vec![
            BoolExpr::eq("posts.user_id", "abc"),
            BoolExpr::ge("likes", 3i64),
        ]);
        sql_where(Some(expr), &mut values, &mut Question, &mut sql);
        assert_eq!(sql, " WHERE (posts.user_id = ?) AND (likes >= 3)");
        assert_eq!(values, vec![SqlVal::Text("abc".to_string())]);
    }

    #[test]
    fn null_comparison_uses_is_null() {
        let mut values = Vec::new();
        let mut sql = String::new();
        sql_where(
            Some(BoolExpr::eq("last_login", None::<String>)),
            &mut values,
            &mut Question,
            &mut sql,
        );
        assert_eq!(sql, " WHERE last_login IS NULL");
        assert!(values.is_empty());
    }

    #[test]
    fn empty_conjunction_matches_everything() {
        let mut values = Vec::new();
        let mut sql = String::new();
        sql_where(
            Some(BoolExpr::AllOf(Vec::new())),
            &mut values,
            &mut Question,
            &mut sql,
        );
        assert_eq!(sql, " WHERE 1 = 1");
    }

    #[test]
    fn relative_update_never_reads_old_value() {
        let mut sql = String::new();
        sql_update_relative(
            "posts",
            &Column::new("id", SqlType::Text),
            &Column::new("likes", SqlType::BigInt),
            -2,
            &mut Question,
            &mut sql,
        );
        assert_eq!(
            sql,
            format!(
                "UPDATE posts SET likes = likes - 2 WHERE {} = ?",
                quote_reserved_word("id")
            )
        );
    }

    #[test]
    fn group_count_orders_by_group() {
        let mut values = Vec::new();
        let mut sql = String::new();
        sql_group_count(
            "likes",
            &[Join::Inner {
                join_table: "posts",
                col1: query::Column::new("likes", "post_id"),
                col2: query::Column::new("posts", "pk"),
            }],
            &query::Column::new("likes", "created_on"),
            Some(BoolExpr::eq("posts.user_id", "u")),
            &mut values,
            &mut Question,
            &mut sql,
        );
        assert_eq!(
            sql,
            "SELECT likes.created_on, COUNT(*) FROM likes \
             INNER JOIN posts ON likes.post_id = posts.pk \
             WHERE posts.user_id = ? \
             GROUP BY likes.created_on ORDER BY likes.created_on ASC"
        );
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn create_table_carries_constraints() {
        let table = Table::new("likes")
            .column(TableColumn::new("id", SqlType::Text).primary_key())
            .column(
                TableColumn::new("post_id", SqlType::Text).references(Reference::new(
                    "posts",
                    "id",
                    OnDelete::Cascade,
                )),
            )
            .column(TableColumn::new("n", SqlType::BigInt).default_value(0i64).check("n >= 0"))
            .unique_together(&["id", "post_id"]);
        let sql = sql_create_table(&table, |c| match c.sqltype() {
            SqlType::BigInt => "BIGINT".into(),
            _ => "TEXT".into(),
        })
        .unwrap();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS likes ("));
        assert!(sql.contains(&format!(
            "post_id TEXT NOT NULL REFERENCES posts({}) ON DELETE CASCADE",
            quote_reserved_word("id")
        )));
        assert!(sql.contains("n BIGINT NOT NULL DEFAULT 0 CHECK (n >= 0)"));
        assert!(sql.contains("post_id)"));
    }
}
