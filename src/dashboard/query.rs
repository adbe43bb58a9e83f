//! Database queries for retrieving dashboard expense data.
//!
//! This module provides the expense view consumed by the dashboard: the raw
//! fields needed for the recent-expenses table plus the (amount, date,
//! category) projection the statistics aggregator works on.

use rusqlite::Connection;
use time::Date;

use crate::{Error, auth::UserID, expense::ExpenseId};

/// A single expense row as consumed by the dashboard.
///
/// This is separate from the main Expense domain model because the dashboard
/// joins in the category name and color for display, and never needs the
/// category ID itself.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct ExpenseRow {
    pub id: ExpenseId,
    pub amount: f64,
    pub date: Date,
    pub description: String,
    /// The category name, or `None` when the expense is uncategorized.
    pub category: Option<String>,
    /// The category's display color, when the expense has a category.
    pub color: Option<String>,
}

/// Gets a user's expenses and their category labels, ordered by date
/// descending (most recent first).
///
/// # Arguments
/// * `user_id` - Only this user's expenses are returned
/// * `since` - Optional inclusive start date bound; `None` returns all time
/// * `connection` - Database connection reference
///
/// # Errors
/// Returns [Error::SqlError] if the query fails.
pub(super) fn get_expenses(
    user_id: UserID,
    since: Option<Date>,
    connection: &Connection,
) -> Result<Vec<ExpenseRow>, Error> {
    const BASE_QUERY: &str = "SELECT
            e.id,
            e.amount,
            e.date,
            e.description,
            category.name,
            category.color
        FROM expense e
        LEFT JOIN category ON category.id = e.category_id
        WHERE e.user_id = ?1";

    let map_row = |row: &rusqlite::Row| {
        Ok(ExpenseRow {
            id: row.get(0)?,
            amount: row.get(1)?,
            date: row.get(2)?,
            description: row.get(3)?,
            category: row.get(4)?,
            color: row.get(5)?,
        })
    };

    let rows = match since {
        Some(start_date) => {
            let query = format!("{BASE_QUERY} AND e.date >= ?2 ORDER BY e.date DESC, e.id DESC");
            let mut stmt = connection.prepare(&query)?;
            let rows = stmt
                .query_map((user_id.as_i64(), start_date), map_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            rows
        }
        None => {
            let query = format!("{BASE_QUERY} ORDER BY e.date DESC, e.id DESC");
            let mut stmt = connection.prepare(&query)?;
            let rows = stmt
                .query_map((user_id.as_i64(),), map_row)?
                .collect::<Result<Vec<_>, rusqlite::Error>>()?;
            rows
        }
    };

    Ok(rows)
}
