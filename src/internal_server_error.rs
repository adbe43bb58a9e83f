//! Defines the templates and route handlers for the page to display for an internal server error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// The description and suggested fix shown on the 500 page.
pub struct InternalServerErrorPage<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerErrorPage<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

pub fn render_internal_server_error(template: InternalServerErrorPage) -> Response {
    let page = error_view(
        "Internal Server Error",
        "500",
        template.description,
        template.fix,
    );

    (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
}

pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(Default::default())
}

/// Get a response that will redirect the client to the internal server error 500 page.
///
/// **Note**: This redirect is intended to be served as a response to a POST
/// request initiated by HTMX. Route handlers using GET should use
/// `axum::response::Redirect` to redirect via a response.
pub(crate) fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
        .into_response()
}

#[cfg(test)]
mod internal_server_error_tests {
    use axum::http::StatusCode;
    use axum_htmx::HX_REDIRECT;

    use crate::endpoints;

    use super::{get_internal_server_error_page, get_internal_server_error_redirect};

    #[tokio::test]
    async fn page_returns_internal_server_error_status() {
        let response = get_internal_server_error_page().await;

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn redirect_targets_error_page() {
        let response = get_internal_server_error_redirect();

        let location = response.headers().get(HX_REDIRECT).unwrap();
        assert_eq!(location, endpoints::INTERNAL_ERROR_VIEW);
    }
}
