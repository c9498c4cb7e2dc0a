//! Inertia protocol middleware.
//! Runs around every handler of an Inertia app.

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::InertiaError;
use crate::http::request::RequestSignals;
use crate::http::response::{correct_redirect, version_conflict};
use crate::inertia::Inertia;
use crate::observability::metrics;

pub async fn inertia_middleware(
    State(inertia): State<Inertia>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let signals = RequestSignals::from_request(&req);

    // 1. AJAX requests must come from the Inertia client.
    if signals.is_malformed() {
        metrics::record_malformed_request();
        return InertiaError::MalformedRequest.into_response();
    }

    // 2. Stale assets: force a full visit before the handler runs.
    if *signals.method() == Method::GET && inertia.is_stale(signals.requested_version()) {
        tracing::debug!(
            path = %signals.full_path(),
            requested = ?signals.requested_version(),
            current = %inertia.version(),
            "Asset version mismatch"
        );
        return version_conflict(signals.full_path());
    }

    // 3. Hand the classification to extractors downstream.
    req.extensions_mut().insert(signals.clone());
    let mut response = next.run(req).await;

    // 4. Redirects after PUT/PATCH/DELETE must be replayed as GET.
    if signals.is_inertia() {
        correct_redirect(signals.method(), &mut response);
    }

    response
}
