//! Inertia protocol header names.

use axum::http::HeaderName;

/// Presence flag sent by the Inertia client on every navigation.
pub const X_INERTIA: HeaderName = HeaderName::from_static("x-inertia");

/// Asset version the client was built against.
pub const X_INERTIA_VERSION: HeaderName = HeaderName::from_static("x-inertia-version");

/// Comma separated prop keys requested by a partial reload.
pub const X_INERTIA_PARTIAL_DATA: HeaderName = HeaderName::from_static("x-inertia-partial-data");

/// Component the partial reload targets.
pub const X_INERTIA_PARTIAL_COMPONENT: HeaderName =
    HeaderName::from_static("x-inertia-partial-component");

/// Comma separated prop keys whose merge behaviour is reset.
pub const X_INERTIA_RESET: HeaderName = HeaderName::from_static("x-inertia-reset");

/// Target of a forced full-page visit (409 responses).
pub const X_INERTIA_LOCATION: HeaderName = HeaderName::from_static("x-inertia-location");

/// AJAX marker set by XHR-based clients.
pub const X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

pub const XML_HTTP_REQUEST: &str = "XMLHttpRequest";
