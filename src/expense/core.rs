//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{Error, auth::UserID, category::CategoryId};

// ============================================================================
// MODELS
// ============================================================================

/// Database identifier for an expense.
pub type ExpenseId = i64;

/// A validated, positive monetary amount.
///
/// Form input arrives as an arbitrary float; wrapping it in this type at the
/// boundary means the rest of the application never sees NaN, infinite, or
/// non-positive amounts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Amount(f64);

impl Amount {
    /// Create an amount, checking that the value is finite and strictly positive.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidAmount] if `value` is NaN,
    /// infinite, zero, or negative.
    pub fn new(value: f64) -> Result<Self, Error> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(Error::InvalidAmount(value))
        }
    }

    /// The amount as a 64 bit float in dollars.
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// A single spending event recorded by a user.
///
/// To create a new `Expense`, use [Expense::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// The ID of the user who recorded the expense.
    pub user_id: UserID,
    /// The amount of money spent, in dollars.
    pub amount: f64,
    /// When the money was spent.
    pub date: Date,
    /// A text description of what the expense was for.
    pub description: String,
    /// The ID of the category the expense belongs to, if any.
    pub category_id: Option<CategoryId>,
}

impl Expense {
    /// Create a new expense.
    ///
    /// Shortcut for [ExpenseBuilder] for discoverability.
    pub fn build(amount: Amount, date: Date, description: &str) -> ExpenseBuilder {
        ExpenseBuilder {
            amount,
            date,
            description: description.to_owned(),
            category_id: None,
        }
    }
}

/// A builder for creating [Expense] instances.
///
/// The builder carries the fields supplied by the user; the owning user and
/// the row ID are filled in by [create_expense].
#[derive(Debug, PartialEq, Clone)]
pub struct ExpenseBuilder {
    /// The amount of money spent. Always positive; refunds and income are
    /// out of scope for this application.
    pub amount: Amount,

    /// The date when the money was spent.
    ///
    /// This represents when the spending actually happened, not when it was
    /// recorded. Dates in the future are rejected by the create endpoint.
    pub date: Date,

    /// A human-readable description of the expense, e.g. "Lunch at the
    /// corner cafe".
    pub description: String,

    /// The category of the expense, e.g. "Groceries", "Transport".
    /// `None` means uncategorized.
    pub category_id: Option<CategoryId>,
}

impl ExpenseBuilder {
    /// Set the category ID for the expense.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new expense in the database from a builder, owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidCategory] if the specified category ID does not refer to
///   a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    builder: ExpenseBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "INSERT INTO expense (user_id, amount, date, description, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, user_id, amount, date, description, category_id",
        )?
        .query_row(
            (
                user_id.as_i64(),
                builder.amount.as_f64(),
                builder.date,
                builder.description,
                builder.category_id,
            ),
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(builder.category_id),
            error => error.into(),
        })?;

    Ok(expense)
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid expense,
/// - or [Error::SqlError] if there is some other SQL error.
#[cfg(test)]
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_id, amount, date, description, category_id
             FROM expense WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Get the number of expenses recorded by `user_id`.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is some SQL error.
#[cfg(test)]
pub fn count_expenses(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM expense WHERE user_id = :user_id;",
            &[(":user_id", &user_id.as_i64())],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                amount REAL NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(user_id) REFERENCES user(id) ON DELETE CASCADE,
                FOREIGN KEY(category_id) REFERENCES category(id) ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Add composite index used by the dashboard page.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_user_id: i64 = row.get(1)?;
    let amount = row.get(2)?;
    let date = row.get(3)?;
    let description = row.get(4)?;
    let category_id = row.get(5)?;

    Ok(Expense {
        id,
        user_id: UserID::new(raw_user_id),
        amount,
        date,
        description,
        category_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod amount_tests {
    use crate::Error;

    use super::Amount;

    #[test]
    fn new_accepts_positive_values() {
        assert_eq!(Amount::new(12.3).unwrap().as_f64(), 12.3);
        assert_eq!(Amount::new(0.01).unwrap().as_f64(), 0.01);
    }

    #[test]
    fn new_rejects_zero_and_negative_values() {
        assert_eq!(Amount::new(0.0), Err(Error::InvalidAmount(0.0)));
        assert_eq!(Amount::new(-4.2), Err(Error::InvalidAmount(-4.2)));
    }

    #[test]
    fn new_rejects_non_finite_values() {
        assert!(Amount::new(f64::NAN).is_err());
        assert!(Amount::new(f64::INFINITY).is_err());
        assert!(Amount::new(f64::NEG_INFINITY).is_err());
    }
}
