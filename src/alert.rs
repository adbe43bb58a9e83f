//! Alert partials for displaying success and error messages to users.
//!
//! Alerts are rendered into the `#alert-container` element via HTMX
//! out-of-band swaps so that form endpoints can report failures without
//! replacing the page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

/// Alert message types for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
}

/// Renders alert messages with appropriate styling.
#[derive(Debug, Clone)]
pub struct AlertView<'a> {
    pub kind: AlertKind,
    pub message: &'a str,
    pub details: &'a str,
}

impl<'a> AlertView<'a> {
    /// Create a new success alert.
    pub fn success(message: &'a str, details: &'a str) -> Self {
        Self {
            kind: AlertKind::Success,
            message,
            details,
        }
    }

    /// Create a new error alert.
    pub fn error(message: &'a str, details: &'a str) -> Self {
        Self {
            kind: AlertKind::Error,
            message,
            details,
        }
    }

    pub fn into_html(self) -> Markup {
        let color_style = match self.kind {
            AlertKind::Success => {
                "text-green-800 border-green-300 bg-green-50 \
                dark:text-green-400 dark:border-green-800"
            }
            AlertKind::Error => {
                "text-red-800 border-red-300 bg-red-50 \
                dark:text-red-400 dark:border-red-800"
            }
        };

        html!(
            div id="alert-container" hx-swap-oob="true"
            {
                div
                    role="alert"
                    class={"p-4 mb-4 border rounded-lg dark:bg-gray-800 " (color_style)}
                {
                    span class="font-medium" { (self.message) }

                    @if !self.details.is_empty() {
                        p class="text-sm" { (self.details) }
                    }
                }
            }
        )
    }

    /// Render the alert as an HTTP response with the given status code.
    pub fn into_response(self, status_code: StatusCode) -> Response {
        (status_code, self.into_html()).into_response()
    }
}
