//! ExTrack is a web app for recording personal expenses and reviewing where
//! the money went.
//!
//! This library provides an HTTP server that directly serves HTML pages:
//! users log in with an email and password, record expenses against
//! categories, and view aggregated spending statistics on a dashboard.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod alert;
mod app_state;
mod auth;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod expense;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod routing;
mod timezone;

pub use app_state::AppState;
pub use auth::{Email, PasswordHash, User, UserID, ValidatedPassword, create_user};
pub use category::{Category, CategoryName, create_category};
pub use db::initialize as initialize_db;
pub use expense::{Amount, Expense, create_expense};
pub use logging::logging_middleware;
pub use routing::build_router;

use crate::{
    alert::AlertView,
    category::CategoryId,
    internal_server_error::{InternalServerErrorPage, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an email and password combination that does not
    /// match a registered user.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no auth cookie in the cookie jar :(")]
    CookieMissing,

    /// A date time could not be computed or formatted.
    ///
    /// Callers should pass in the original error as a string.
    #[error("could not process date-time: {0}")]
    DateError(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The string used to register or log in is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The email used to register already belongs to another user.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category name used to create a category already exists.
    #[error("a category with that name already exists")]
    DuplicateCategoryName,

    /// The category ID used to create an expense did not match a valid
    /// category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// A non-positive or non-numeric amount was used to create an expense.
    #[error("{0} is not a valid expense amount")]
    InvalidAmount(f64),

    /// An empty string was used as an expense description.
    #[error("Expense description cannot be empty")]
    EmptyDescription,

    /// A date in the future was used to create an expense.
    ///
    /// Expenses record spending that has already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical
    /// timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON.
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete an expense that does not exist.
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to delete a category that does not exist.
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("category.name") =>
            {
                Error::DuplicateCategoryName
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerErrorPage {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings \
                        and ensure the timezone has been set to a valid, canonical timezone string."
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::FutureDate(date) => AlertView::error(
                "Invalid expense date",
                &format!("{date} is a date in the future, which is not allowed."),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::InvalidAmount(amount) => AlertView::error(
                "Invalid amount",
                &format!("{amount} is not a valid amount. Enter a positive number."),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::EmptyDescription => AlertView::error(
                "Missing description",
                "Enter a short description of what the expense was for.",
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::InvalidCategory(category_id) => AlertView::error(
                "Invalid category ID",
                &format!("Could not find a category with the ID {category_id:?}"),
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::EmptyCategoryName => AlertView::error(
                "Invalid category name",
                "The category name cannot be empty.",
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::DuplicateCategoryName => AlertView::error(
                "Duplicate category",
                "A category with that name already exists. \
                Choose a different name, or delete the existing category first.",
            )
            .into_response(StatusCode::BAD_REQUEST),
            Error::DeleteMissingExpense => AlertView::error(
                "Could not delete expense",
                "The expense could not be found. \
                Try refreshing the page to see if the expense has already been deleted.",
            )
            .into_response(StatusCode::NOT_FOUND),
            Error::DeleteMissingCategory => AlertView::error(
                "Could not delete category",
                "The category could not be found. \
                Try refreshing the page to see if the category has already been deleted.",
            )
            .into_response(StatusCode::NOT_FOUND),
            _ => AlertView::error(
                "Something went wrong",
                "An unexpected error occurred, check the server logs for more details.",
            )
            .into_response(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }
}
