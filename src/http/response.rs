//! Response negotiation.
//!
//! # Responsibilities
//! - Version conflict: empty 409 with `X-Inertia-Location`
//! - Inertia visit: page as JSON with `X-Inertia` / `Vary` headers
//! - First load: page embedded in the root template as HTML
//! - Redirect correction: 301/302 after PUT/PATCH/DELETE becomes 303
//!
//! # Design Decisions
//! - The page is serialized once; both branches ship the same JSON
//! - Handler-declared status and headers survive negotiation

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value};

use crate::error::InertiaError;
use crate::http::headers::{X_INERTIA, X_INERTIA_LOCATION};
use crate::http::request::RequestSignals;
use crate::observability::metrics;
use crate::page::Page;
use crate::template::TemplateRenderer;

/// 409 response asking the client to do a full visit of `url`.
///
/// A `url` that is not a valid header value yields a bare 500.
pub fn location(url: &str) -> Response {
    match HeaderValue::from_str(url) {
        Ok(value) => (StatusCode::CONFLICT, [(X_INERTIA_LOCATION, value)]).into_response(),
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Invalid X-Inertia-Location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The client's asset version is stale: reload `full_path` from scratch.
pub fn version_conflict(full_path: &str) -> Response {
    metrics::record_version_conflict();
    location(full_path)
}

/// Status a redirect should carry given the method that caused it.
pub fn corrected_status(method: &Method, status: StatusCode) -> StatusCode {
    let redirect = status == StatusCode::MOVED_PERMANENTLY || status == StatusCode::FOUND;
    let rewrites = *method == Method::PUT || *method == Method::PATCH || *method == Method::DELETE;
    if redirect && rewrites {
        StatusCode::SEE_OTHER
    } else {
        status
    }
}

/// Rewrite 301/302 to 303 in place when the method requires it.
pub fn correct_redirect(method: &Method, response: &mut Response) {
    let status = corrected_status(method, response.status());
    if status != response.status() {
        tracing::debug!(method = %method, from = %response.status(), "Redirect rewritten to 303");
        metrics::record_redirect_rewritten();
        *response.status_mut() = status;
    }
}

/// Everything a page response needs besides the page itself.
pub struct Negotiation<'a> {
    pub signals: &'a RequestSignals,
    pub renderer: &'a dyn TemplateRenderer,
    pub template: &'a str,
    pub view_data: &'a Map<String, Value>,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl Negotiation<'_> {
    /// Pick JSON or HTML for `page` and finalize status and headers.
    pub fn respond(self, page: &Page) -> Result<Response, InertiaError> {
        let json = page.to_json()?;
        let mut headers = self.headers;

        let body = if self.signals.is_inertia() {
            headers.insert(header::VARY, HeaderValue::from_static("X-Inertia"));
            headers.insert(X_INERTIA, HeaderValue::from_static("true"));
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            metrics::record_page("json");
            json
        } else {
            let html = self.renderer.render(self.template, &json, self.view_data)?;
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            );
            metrics::record_page("html");
            html
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        response.headers_mut().extend(headers);
        Ok(response)
    }
}
