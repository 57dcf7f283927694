//! Likes per calendar day.

use chrono::NaiveDate;
use likes_core::db::ConnectionMethods;
use likes_core::query::{BoolExpr, Column, Join};
use likes_core::{FromSql, GroupCount, SqlType};
use serde::{Deserialize, Serialize};

use crate::models::{Like, Model, Post};
use crate::policy::{resolve_scope, Caller, Scope, UserSelector};
use crate::{Error, Result};

const DATE_FORMAT_MESSAGE: &str = "Invalid date format. Use YYYY-MM-DD.";

/// Filters of an analytics request, as received.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsParams {
    /// First day counted, inclusive.
    #[serde(default)]
    pub date_from: Option<String>,
    /// Last day counted, inclusive.
    #[serde(default)]
    pub date_to: Option<String>,
    /// `all`, a user id, or nothing for the caller's own posts.
    #[serde(default)]
    pub user: Option<String>,
}

/// One entry of the series returned by [`likes_per_day`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikesPerDay {
    /// The day, in the offset each like was made in.
    pub date: NaiveDate,
    /// Likes made that day. Never zero.
    pub likes_count: i64,
}

/// Parse a `YYYY-MM-DD` date. Anything else, including other
/// representations chrono would accept, is a validation error on `field`.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let bytes = value.as_bytes();
    let shaped = bytes.len() == 10
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });
    if !shaped {
        return Err(Error::validation(field, DATE_FORMAT_MESSAGE));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::validation(field, DATE_FORMAT_MESSAGE))
}

fn optional_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>> {
    match value {
        None | Some("") => Ok(None),
        Some(v) => parse_date(field, v).map(Some),
    }
}

/// Count likes per calendar day on the posts `params` selects.
///
/// The series is ascending by date and sparse: days without likes are
/// absent. Inputs are validated and access is checked before the store
/// is touched.
pub fn likes_per_day<C>(
    conn: &C,
    caller: &Caller,
    params: &AnalyticsParams,
) -> Result<Vec<LikesPerDay>>
where
    C: ConnectionMethods + ?Sized,
{
    let from = optional_date("date_from", params.date_from.as_deref())?;
    let to = optional_date("date_to", params.date_to.as_deref())?;
    let selector = UserSelector::parse(params.user.as_deref())?;
    let scope = resolve_scope(caller, selector)?;

    if let (Some(from), Some(to)) = (from, to) {
        if from > to {
            return Ok(Vec::new());
        }
    }

    let mut filters = Vec::new();
    if let Scope::OwnedBy(owner) = scope {
        filters.push(BoolExpr::eq("posts.user_id", owner));
    }
    if let Some(from) = from {
        filters.push(BoolExpr::ge("likes.created_on", from));
    }
    if let Some(to) = to {
        filters.push(BoolExpr::le("likes.created_on", to));
    }

    let rows = GroupCount::new(
        Like::TABLE,
        Column::new(Like::TABLE, "created_on"),
        SqlType::Date,
    )
    .join(Join::Inner {
        join_table: Post::TABLE,
        col1: Column::new(Like::TABLE, "post_id"),
        col2: Column::new(Post::TABLE, "id"),
    })
    .filter(BoolExpr::all_of(filters))
    .load(conn)?;

    rows.into_iter()
        .map(|(date, likes_count)| -> Result<LikesPerDay> {
            Ok(LikesPerDay {
                date: NaiveDate::from_sql(date)?,
                likes_count,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_shape_is_strict() {
        assert!(parse_date("date_from", "2024-01-15").is_ok());
        for bad in [
            "2024-13-01",
            "2024-02-30",
            "2024-1-15",
            "24-01-15",
            "2024/01/15",
            "2024-01-15T00:00",
            " 2024-01-15",
            "",
        ] {
            let err = parse_date("date_from", bad).unwrap_err();
            assert_eq!(err.field(), Some("date_from"), "{bad}");
            assert!(err.to_string().contains("Use YYYY-MM-DD"), "{bad}");
        }
    }

    #[test]
    fn per_day_serializes_flat() {
        let entry = LikesPerDay {
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            likes_count: 3,
        };
        assert_eq!(
            serde_json::to_string(&entry).unwrap(),
            r#"{"date":"2024-01-01","likes_count":3}"#
        );
    }
}
