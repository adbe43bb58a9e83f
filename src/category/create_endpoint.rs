//! Defines the endpoint for creating a new category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{CategoryName, db::create_category, domain::DEFAULT_CATEGORY_COLOR},
    endpoints,
};

/// The state needed to create a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryState {
    /// The database connection for managing categories.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    /// The display name for the category.
    pub name: String,
    /// The color swatch shown next to the category.
    #[serde(default)]
    pub color: Option<String>,
}

/// A route handler for creating a new category, redirects to the categories
/// view on success.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryState>,
    Form(form): Form<CategoryForm>,
) -> impl IntoResponse {
    let name = match CategoryName::new(&form.name) {
        Ok(name) => name,
        Err(error) => return error.into_alert_response(),
    };
    let color = form
        .color
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    if let Err(error) = create_category(name, &color, &connection) {
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
