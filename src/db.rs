//! Database initialization for the application.

use rusqlite::Connection;

use crate::{
    auth::create_user_table, category::create_category_table, expense::create_expense_table,
};

/// Create the tables for all of the application's domain models.
///
/// Tables are created in dependency order so that foreign keys resolve.
/// Foreign key enforcement is switched on for the connection since SQLite
/// leaves it off by default.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch("PRAGMA foreign_keys = ON;")?;

    create_user_table(connection)?;
    create_category_table(connection)?;
    create_expense_table(connection)?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");

        let count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master
                 WHERE type = 'table' AND name IN ('user', 'category', 'expense')",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 3);
    }

    #[test]
    fn is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).expect("Could not initialize database");
        initialize(&connection).expect("Second initialization should not fail");
    }
}
