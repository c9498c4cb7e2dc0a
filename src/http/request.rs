//! Request classification.
//!
//! # Responsibilities
//! - Extract every protocol-relevant fact from an inbound request once
//! - Normalize comma separated key lists (absent or empty header = empty set)
//! - Answer "is this a partial reload of component X" exactly
//!
//! # Design Decisions
//! - `RequestSignals` is immutable and cheap to clone; the middleware stores
//!   it in request extensions so handlers reuse the same value
//! - Component matching is case-sensitive

use std::collections::HashSet;
use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method, Request, Uri};

use crate::http::headers::{
    XML_HTTP_REQUEST, X_INERTIA, X_INERTIA_PARTIAL_COMPONENT, X_INERTIA_PARTIAL_DATA,
    X_INERTIA_RESET, X_INERTIA_VERSION, X_REQUESTED_WITH,
};

/// Protocol facts about a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSignals {
    is_inertia: bool,
    is_xhr: bool,
    has_partial_data: bool,
    partial_component: Option<String>,
    partial_keys: HashSet<String>,
    reset_keys: HashSet<String>,
    requested_version: Option<String>,
    method: Method,
    full_path: String,
}

impl RequestSignals {
    /// Classify a request from its method, URI and headers.
    pub fn new(method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            is_inertia: headers.contains_key(X_INERTIA),
            is_xhr: header_str(headers, &X_REQUESTED_WITH) == Some(XML_HTTP_REQUEST),
            has_partial_data: headers.contains_key(X_INERTIA_PARTIAL_DATA),
            partial_component: header_str(headers, &X_INERTIA_PARTIAL_COMPONENT)
                .map(str::to_string),
            partial_keys: split_keys(header_str(headers, &X_INERTIA_PARTIAL_DATA)),
            reset_keys: split_keys(header_str(headers, &X_INERTIA_RESET)),
            requested_version: header_str(headers, &X_INERTIA_VERSION).map(str::to_string),
            method: method.clone(),
            full_path: uri
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| uri.path().to_string()),
        }
    }

    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::new(req.method(), req.uri(), req.headers())
    }

    pub fn from_parts(parts: &Parts) -> Self {
        Self::new(&parts.method, &parts.uri, &parts.headers)
    }

    /// True when the client sent `X-Inertia`.
    pub fn is_inertia(&self) -> bool {
        self.is_inertia
    }

    /// True when the client flagged the request as XHR.
    pub fn is_xhr(&self) -> bool {
        self.is_xhr
    }

    /// An XHR request that is not an Inertia visit cannot be served by the protocol.
    pub fn is_malformed(&self) -> bool {
        self.is_xhr && !self.is_inertia
    }

    /// True iff partial data was requested for exactly `component`.
    pub fn is_partial_render(&self, component: &str) -> bool {
        self.has_partial_data && self.partial_component.as_deref() == Some(component)
    }

    pub fn partial_keys(&self) -> &HashSet<String> {
        &self.partial_keys
    }

    pub fn reset_keys(&self) -> &HashSet<String> {
        &self.reset_keys
    }

    pub fn requested_version(&self) -> Option<&str> {
        self.requested_version.as_deref()
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path plus query string, as the client requested it.
    pub fn full_path(&self) -> &str {
        &self.full_path
    }
}

impl<S> FromRequestParts<S> for RequestSignals
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestSignals>()
            .cloned()
            .unwrap_or_else(|| RequestSignals::from_parts(parts)))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &axum::http::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn split_keys(raw: Option<&str>) -> HashSet<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
