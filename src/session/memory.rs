//! In-process session store keyed by a cookie.
//!
//! Good enough for the demo server and tests; data is lost on restart and is
//! not shared between processes. Sessions never expire: an entry lives until
//! its last key is removed.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::session::{Session, SessionStore};

/// Default name of the session cookie.
pub const DEFAULT_COOKIE: &str = "inertia_session";

type SessionData = HashMap<String, Value>;

/// All sessions of the process.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<String, SessionData>>,
    cookie_name: String,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::with_cookie_name(DEFAULT_COOKIE)
    }

    pub fn with_cookie_name(name: impl Into<String>) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            cookie_name: name.into(),
        }
    }

    /// Handle to one client's session.
    pub fn session(&self, id: &str) -> Session {
        Arc::new(MemorySession {
            sessions: self.sessions.clone(),
            id: id.to_string(),
        })
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Number of sessions holding data.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

struct MemorySession {
    sessions: Arc<DashMap<String, SessionData>>,
    id: String,
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<Value> {
        self.sessions
            .get(&self.id)
            .and_then(|data| data.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) {
        self.sessions
            .entry(self.id.clone())
            .or_default()
            .insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) -> Option<Value> {
        // The shard lock is held for the whole read-and-clear.
        let removed = self
            .sessions
            .get_mut(&self.id)
            .and_then(|mut data| data.remove(key));
        if removed.is_some() {
            self.sessions.remove_if(&self.id, |_, data| data.is_empty());
        }
        removed
    }
}

/// Attach a `Session` to every request, issuing a cookie on first visit.
pub async fn session_middleware(
    State(store): State<MemorySessionStore>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let existing = cookie_value(req.headers(), store.cookie_name());
    let id = existing
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(store.session(&id));
    let mut response = next.run(req).await;

    if existing.is_none() {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            store.cookie_name(),
            id
        );
        match HeaderValue::from_str(&cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => tracing::warn!(error = %e, "Invalid session cookie"),
        }
    }

    response
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, v)| *k == name && !v.is_empty())
        .map(|(_, v)| v.to_string())
}
