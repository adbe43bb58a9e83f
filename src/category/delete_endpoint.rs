//! Defines the endpoint for deleting a category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::IntoResponse,
};
use maud::html;
use rusqlite::Connection;

use crate::{AppState, Error, category::CategoryId, category::db::delete_category};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    /// The database connection for managing categories.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting a category.
///
/// On success the response body is empty so that HTMX removes the table row.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Path(category_id): Path<CategoryId>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => html!().into_response(),
        Err(error @ Error::DeleteMissingCategory) => error.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;

    use crate::{
        Error,
        category::{CategoryName, create_category, get_category},
        db::initialize,
    };

    use super::{DeleteCategoryState, delete_category_endpoint};

    fn get_test_state() -> DeleteCategoryState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        DeleteCategoryState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deletes_category() {
        let state = get_test_state();
        let category = {
            let connection = state.db_connection.lock().unwrap();
            create_category(CategoryName::new_unchecked("Food"), "#ef4444", &connection).unwrap()
        };

        let response = delete_category_endpoint(State(state.clone()), Path(category.id))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_category(category.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn delete_missing_category_returns_not_found() {
        let state = get_test_state();

        let response = delete_category_endpoint(State(state), Path(999))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
