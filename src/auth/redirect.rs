//! Builds the log-in redirect URLs used when an unauthenticated client hits a
//! protected route.

use axum::{extract::Request, http::Uri};

use crate::endpoints;

/// Validate a client-supplied redirect target.
///
/// Only same-origin absolute paths are accepted. Anything else (full URLs,
/// scheme-relative URLs) is rejected so that the log-in flow cannot be used
/// as an open redirect.
pub(crate) fn normalize_redirect_url(raw_url: &str) -> Option<String> {
    let trimmed = raw_url.trim();

    if trimmed.starts_with('/') && !trimmed.starts_with("//") {
        Some(trimmed.to_owned())
    } else {
        None
    }
}

/// Build the log-in page URL with `target` as the redirect_url query parameter.
pub(crate) fn build_log_in_redirect_url_from_target(target: &str) -> Option<String> {
    let target = normalize_redirect_url(target)?;
    let query = serde_urlencoded::to_string([("redirect_url", target.as_str())]).ok()?;

    Some(format!("{}?{}", endpoints::LOG_IN_VIEW, query))
}

/// Build the log-in redirect URL for `request`.
///
/// For page requests the redirect target is the request's own path and query.
/// For `/api` requests (HTMX form submissions) the target is taken from the
/// `HX-Current-URL` header so the user lands back on the page they were
/// looking at, not on the API endpoint.
pub(crate) fn build_log_in_redirect_url(request: &Request) -> Option<String> {
    let target = if request.uri().path().starts_with("/api") {
        let current_url = request.headers().get("HX-Current-URL")?.to_str().ok()?;
        // HX-Current-URL is an absolute URL, keep only the path and query.
        let uri: Uri = current_url.parse().ok()?;
        uri.path_and_query()?.as_str().to_owned()
    } else {
        request.uri().path_and_query()?.as_str().to_owned()
    };

    build_log_in_redirect_url_from_target(&target)
}
