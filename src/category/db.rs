//! Database operations for categories.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    category::{Category, CategoryId, CategoryName},
};

/// Create a category and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateCategoryName] if a category with `name` already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_category(
    name: CategoryName,
    color: &str,
    connection: &Connection,
) -> Result<Category, Error> {
    connection.execute(
        "INSERT INTO category (name, color) VALUES (?1, ?2);",
        (name.as_ref(), color),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Category {
        id,
        name,
        color: color.to_string(),
    })
}

/// Retrieve a single category by ID.
pub fn get_category(category_id: CategoryId, connection: &Connection) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, name, color FROM category WHERE id = :id;")?
        .query_row(&[(":id", &category_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all categories ordered alphabetically by name.
pub fn get_all_categories(connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare("SELECT id, name, color FROM category ORDER BY name ASC;")?
        .query_map([], map_row)?
        .map(|maybe_category| maybe_category.map_err(|error| error.into()))
        .collect()
}

/// Delete a category by ID. Returns an error if the category doesn't exist.
///
/// Expenses referencing the category keep their rows; the foreign key sets
/// their category to NULL so they show up as uncategorized.
pub fn delete_category(category_id: CategoryId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM category WHERE id = ?1", [category_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(())
}

/// Initialize the category table and indexes.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            color TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_category_name ON category(name);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_name: String = row.get(1)?;
    let color = row.get(2)?;

    Ok(Category {
        id,
        name: CategoryName::new_unchecked(&raw_name),
        color,
    })
}

#[cfg(test)]
mod category_query_tests {
    use rusqlite::Connection;

    use crate::{Error, category::CategoryName};

    use super::{
        create_category, create_category_table, delete_category, get_all_categories, get_category,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_category_table(&connection).expect("Could not create category table");
        connection
    }

    #[test]
    fn create_category_succeeds() {
        let connection = get_test_db_connection();
        let name = CategoryName::new("Groceries").unwrap();

        let category = create_category(name.clone(), "#ef4444", &connection);

        let got_category = category.expect("Could not create category");
        assert!(got_category.id > 0);
        assert_eq!(got_category.name, name);
        assert_eq!(got_category.color, "#ef4444");
    }

    #[test]
    fn create_category_fails_on_duplicate_name() {
        let connection = get_test_db_connection();
        let name = CategoryName::new_unchecked("Groceries");
        create_category(name.clone(), "#ef4444", &connection).expect("Could not create category");

        let duplicate = create_category(name, "#3b82f6", &connection);

        assert_eq!(duplicate, Err(Error::DuplicateCategoryName));
    }

    #[test]
    fn get_category_succeeds() {
        let connection = get_test_db_connection();
        let inserted = create_category(CategoryName::new_unchecked("Foo"), "#ef4444", &connection)
            .expect("Could not create test category");

        let selected = get_category(inserted.id, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_category_with_invalid_id_returns_not_found() {
        let connection = get_test_db_connection();
        let inserted = create_category(CategoryName::new_unchecked("Foo"), "#ef4444", &connection)
            .expect("Could not create test category");

        let selected = get_category(inserted.id + 123, &connection);

        assert_eq!(selected, Err(Error::NotFound));
    }

    #[test]
    fn get_all_categories_returns_categories_sorted_by_name() {
        let connection = get_test_db_connection();
        create_category(CategoryName::new_unchecked("Transport"), "#3b82f6", &connection)
            .expect("Could not create test category");
        create_category(CategoryName::new_unchecked("Food"), "#ef4444", &connection)
            .expect("Could not create test category");

        let categories = get_all_categories(&connection).expect("Could not get all categories");

        let names: Vec<&str> = categories
            .iter()
            .map(|category| category.name.as_ref())
            .collect();
        assert_eq!(names, vec!["Food", "Transport"]);
    }

    #[test]
    fn delete_category_succeeds() {
        let connection = get_test_db_connection();
        let category =
            create_category(CategoryName::new_unchecked("ToDelete"), "#ef4444", &connection)
                .expect("Could not create test category");

        let result = delete_category(category.id, &connection);

        assert!(result.is_ok());

        let get_result = get_category(category.id, &connection);
        assert_eq!(get_result, Err(Error::NotFound));
    }

    #[test]
    fn delete_category_with_invalid_id_returns_not_found() {
        let connection = get_test_db_connection();
        let invalid_id = 999999;

        let result = delete_category(invalid_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }
}
