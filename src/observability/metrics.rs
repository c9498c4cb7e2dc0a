//! Metrics collection and exposition.
//!
//! # Metrics
//! - `inertia_pages_total` (counter): pages sent, by `kind` (json, html)
//! - `inertia_version_conflicts_total` (counter): 409 responses for stale assets
//! - `inertia_redirects_rewritten_total` (counter): 301/302 rewritten to 303
//! - `inertia_malformed_requests_total` (counter): XHR requests without `X-Inertia`
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_page(kind: &'static str) {
    counter!("inertia_pages_total", "kind" => kind).increment(1);
}

pub fn record_version_conflict() {
    counter!("inertia_version_conflicts_total").increment(1);
}

pub fn record_redirect_rewritten() {
    counter!("inertia_redirects_rewritten_total").increment(1);
}

pub fn record_malformed_request() {
    counter!("inertia_malformed_requests_total").increment(1);
}
