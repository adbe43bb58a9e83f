//! The registration page for creating an account with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    app_state::create_cookie_key,
    auth::{
        DEFAULT_COOKIE_DURATION, Email, PasswordHash, ValidatedPassword, create_user,
        set_auth_cookie,
    },
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, auth_card, base, email_input, loading_spinner, password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
};

fn registration_form(
    email: &str,
    email_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #confirm_password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email, email_error_message))
            (password_input("password", "Password", password_error_message))
            (password_input(
                "confirm_password",
                "Confirm Password",
                confirm_password_error_message,
            ))

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", None, None, None);
    let content = auth_card("Create your account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for creating users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

const PASSWORDS_DO_NOT_MATCH_MSG: &str = "The passwords do not match.";
const EMAIL_TAKEN_MSG: &str = "That email address is already registered.";

/// The form data sent by the registration form.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    /// The email address to register with.
    pub email: String,
    /// The password in plain text.
    pub password: String,
    /// The password repeated, to catch typos.
    pub confirm_password: String,
}

/// A route handler for creating a new user.
///
/// On success the user is logged in immediately: the auth cookie is set and
/// the client is redirected to the dashboard. On a validation failure the
/// form is returned with an inline error message.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let email = match Email::new(&form.email) {
        Ok(email) => email,
        Err(Error::InvalidEmail(_)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                registration_form(
                    &form.email,
                    Some("Enter a valid email address."),
                    None,
                    None,
                ),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    if form.password != form.confirm_password {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            registration_form(&form.email, None, None, Some(PASSWORDS_DO_NOT_MATCH_MSG)),
        )
            .into_response();
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(Error::TooWeak(feedback)) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                registration_form(&form.email, None, Some(&feedback), None),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("could not hash password: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user = match create_user(email, password_hash, &connection) {
        Ok(user) => user,
        Err(Error::DuplicateEmail) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                registration_form(&form.email, Some(EMAIL_TAKEN_MSG), None, None),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    let jar = match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("could not set auth cookie: {error}");
            return get_internal_server_error_redirect();
        }
    };

    (
        jar,
        HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod register_tests {
    use std::sync::{Arc, Mutex};

    use axum::{body::Body, extract::State, http::Response, response::IntoResponse};
    use axum_extra::extract::{Form, PrivateCookieJar};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{auth::get_user_by_email, db::initialize, endpoints};

    use super::{
        EMAIL_TAKEN_MSG, PASSWORDS_DO_NOT_MATCH_MSG, RegisterForm, RegistrationState,
        get_register_page, register_user,
    };

    fn get_test_state() -> RegistrationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RegistrationState::new("averysecretsecret", Arc::new(Mutex::new(connection)))
    }

    fn get_jar(state: &RegistrationState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    fn register_form(email: &str, password: &str, confirm_password: &str) -> RegisterForm {
        RegisterForm {
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm_password.to_string(),
        }
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    #[tokio::test]
    async fn register_page_contains_form() {
        let response = get_register_page().await;

        let text = body_text(response).await;
        assert!(text.contains("name=\"email\""));
        assert!(text.contains("name=\"password\""));
        assert!(text.contains("name=\"confirm_password\""));
    }

    #[tokio::test]
    async fn register_creates_user_and_redirects_to_dashboard() {
        let state = get_test_state();
        let jar = get_jar(&state);
        let form = register_form(
            "jane@example.com",
            "averygoodpassword1",
            "averygoodpassword1",
        );

        let response = register_user(State(state.clone()), jar, Form(form))
            .await
            .into_response();

        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::DASHBOARD_VIEW
        );

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_email("jane@example.com", &connection).unwrap();
        assert_eq!(user.email.as_ref(), "jane@example.com");
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let state = get_test_state();
        let jar = get_jar(&state);
        let form = register_form("not-an-email", "averygoodpassword1", "averygoodpassword1");

        let response = register_user(State(state), jar, Form(form))
            .await
            .into_response();

        let text = body_text(response).await;
        assert!(text.contains("Enter a valid email address."));
    }

    #[tokio::test]
    async fn register_rejects_mismatched_passwords() {
        let state = get_test_state();
        let jar = get_jar(&state);
        let form = register_form(
            "jane@example.com",
            "averygoodpassword1",
            "adifferentpassword2",
        );

        let response = register_user(State(state), jar, Form(form))
            .await
            .into_response();

        let text = body_text(response).await;
        assert!(text.contains(PASSWORDS_DO_NOT_MATCH_MSG));
    }

    #[tokio::test]
    async fn register_rejects_weak_password() {
        let state = get_test_state();
        let jar = get_jar(&state);
        let form = register_form("jane@example.com", "hunter2", "hunter2");

        let response = register_user(State(state.clone()), jar, Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), 422);

        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_by_email("jane@example.com", &connection).is_err());
    }

    #[tokio::test]
    async fn register_rejects_duplicate_email() {
        let state = get_test_state();

        let jar = get_jar(&state);
        let form = register_form(
            "jane@example.com",
            "averygoodpassword1",
            "averygoodpassword1",
        );
        register_user(State(state.clone()), jar, Form(form)).await;

        let jar = get_jar(&state);
        let form = register_form(
            "jane@example.com",
            "anotherfinepassword2",
            "anotherfinepassword2",
        );
        let response = register_user(State(state), jar, Form(form))
            .await
            .into_response();

        let text = body_text(response).await;
        assert!(text.contains(EMAIL_TAKEN_MSG));
    }
}
