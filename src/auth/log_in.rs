//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The rest of the auth module handles the lower level cookie and token logic.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
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
        DEFAULT_COOKIE_DURATION, User, get_user_by_email, redirect::normalize_redirect_url,
        set_auth_cookie,
    },
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, auth_card, base, email_input, loading_spinner, password_input},
    internal_server_error::get_internal_server_error_redirect,
};

fn log_in_form(email: &str, error_message: Option<&str>, redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            (email_input(email, None))
            (password_input("password", "Password", error_message))

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400" {
                "Don't have an account? "
                a
                    href=(endpoints::REGISTER_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Register here"
                }
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// The query parameters accepted by the log-in page.
#[derive(Deserialize)]
pub struct RedirectQuery {
    /// Where to send the client after a successful log-in.
    pub redirect_url: Option<String>,
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form("", None, redirect_url.as_deref());
    let content = auth_card("Log in to your account", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a log-in.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl LoginState {
    /// Create the cookie key from a string and set the default cookie duration.
    pub fn new(cookie_secret: &str, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

pub const INVALID_CREDENTIALS_ERROR_MSG: &str = "Incorrect email or password.";

/// The form data sent by the log-in form.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// The email the user registered with.
    pub email: String,
    /// The user's password in plain text.
    pub password: String,
    /// Whether to keep the user logged in for an extended period.
    #[serde(default)]
    pub remember_me: Option<String>,
    /// Where to send the client after a successful log-in.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the requested page or the dashboard. Otherwise, the form is
/// returned with an error message explaining the problem.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<LogInData>,
) -> Response {
    let redirect_url = parse_redirect_url(user_data.redirect_url.as_deref(), "log-in form");
    let redirect_url = redirect_url.as_deref();

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_response();
        }
    };

    let user: User = match get_user_by_email(&user_data.email, &connection) {
        Ok(user) => user,
        Err(Error::NotFound) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                log_in_form(
                    &user_data.email,
                    Some(INVALID_CREDENTIALS_ERROR_MSG),
                    redirect_url,
                ),
            )
                .into_response();
        }
        Err(error) => return error.into_response(),
    };

    match user.password_hash.verify(&user_data.password) {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                log_in_form(
                    &user_data.email,
                    Some(INVALID_CREDENTIALS_ERROR_MSG),
                    redirect_url,
                ),
            )
                .into_response();
        }
        Err(error) => {
            tracing::error!("an error occurred while verifying a password: {error}");
            return get_internal_server_error_redirect();
        }
    }

    let cookie_duration = if user_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = match set_auth_cookie(jar, user.id, cookie_duration) {
        Ok(jar) => jar,
        Err(error) => {
            tracing::error!("could not set auth cookie: {error}");
            return get_internal_server_error_redirect();
        }
    };

    let destination = redirect_url.unwrap_or(endpoints::DASHBOARD_VIEW);

    (
        jar,
        HxRedirect(destination.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        body::Body,
        extract::{Query, State},
        http::{Response, StatusCode},
        response::IntoResponse,
    };
    use axum_extra::extract::{Form, PrivateCookieJar};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        auth::{COOKIE_TOKEN, Email, PasswordHash, ValidatedPassword, create_user},
        db::initialize,
        endpoints,
    };

    use super::{
        INVALID_CREDENTIALS_ERROR_MSG, LogInData, LoginState, RedirectQuery, get_log_in_page,
        post_log_in,
    };

    const TEST_EMAIL: &str = "jane@example.com";
    const TEST_PASSWORD: &str = "averygoodpassword1";

    fn get_test_state() -> LoginState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        // Minimum cost keeps the test fast.
        let password_hash =
            PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4).unwrap();
        create_user(Email::new_unchecked(TEST_EMAIL), password_hash, &connection).unwrap();

        LoginState::new("averysecretsecret", Arc::new(Mutex::new(connection)))
    }

    fn get_jar(state: &LoginState) -> PrivateCookieJar {
        PrivateCookieJar::new(state.cookie_key.clone())
    }

    fn log_in_form(email: &str, password: &str) -> LogInData {
        LogInData {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: None,
            redirect_url: None,
        }
    }

    async fn body_text(response: Response<Body>) -> String {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&body).to_string()
    }

    #[tokio::test]
    async fn log_in_page_contains_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None }))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("name=\"email\""));
        assert!(text.contains("name=\"password\""));
    }

    #[tokio::test]
    async fn log_in_with_valid_credentials_sets_cookie_and_redirects() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(log_in_form(TEST_EMAIL, TEST_PASSWORD)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            endpoints::DASHBOARD_VIEW
        );

        let set_cookie = response
            .headers()
            .get("set-cookie")
            .expect("expected a set-cookie header")
            .to_str()
            .unwrap();
        assert!(set_cookie.starts_with(COOKIE_TOKEN));
    }

    #[tokio::test]
    async fn log_in_with_wrong_password_returns_form_with_error() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(log_in_form(TEST_EMAIL, "wrong password")),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = body_text(response).await;
        assert!(text.contains(INVALID_CREDENTIALS_ERROR_MSG));
    }

    #[tokio::test]
    async fn log_in_with_unknown_email_returns_form_with_error() {
        let state = get_test_state();
        let jar = get_jar(&state);

        let response = post_log_in(
            State(state),
            jar,
            Form(log_in_form("nobody@example.com", TEST_PASSWORD)),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let text = body_text(response).await;
        assert!(text.contains(INVALID_CREDENTIALS_ERROR_MSG));
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_page() {
        let state = get_test_state();
        let jar = get_jar(&state);
        let form = LogInData {
            email: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string(),
            remember_me: None,
            redirect_url: Some("/dashboard?filter=month".to_string()),
        };

        let response = post_log_in(State(state), jar, Form(form)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get(HX_REDIRECT).unwrap(),
            "/dashboard?filter=month"
        );
    }
}
