//! Session collaborator.
//!
//! # Responsibilities
//! - Define the narrow store interface the protocol needs (get/set/remove)
//! - One-shot `clearHistory` flag: set by a handler, consumed by the next page
//! - Flash messages carried to the next rendered page
//!
//! # Design Decisions
//! - The store is injected per request through extensions as `Session`
//! - Read-and-clear uses `remove`, which implementations make atomic per session
//! - The protocol core never knows which backend holds the data

pub mod memory;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use memory::{session_middleware, MemorySessionStore};

/// Session key of the one-shot clear-history flag.
pub const CLEAR_HISTORY_KEY: &str = "_inertia_clear_history";

/// Session key holding pending flash messages.
pub const FLASH_KEY: &str = "messages";

/// Key/value access to the current client's session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value);
    /// Remove and return a value in one step.
    fn remove(&self, key: &str) -> Option<Value>;
}

/// Handle to the session of the request being served.
pub type Session = Arc<dyn SessionStore>;

/// Ask the next rendered page to clear the client's history state.
pub fn flag_clear_history(session: &dyn SessionStore) {
    session.set(CLEAR_HISTORY_KEY, Value::Bool(true));
}

/// Consume the clear-history flag. Returns false when it was never set.
pub fn take_clear_history(session: &dyn SessionStore) -> bool {
    matches!(session.remove(CLEAR_HISTORY_KEY), Some(Value::Bool(true)))
}

/// A message shown once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub category: String,
    pub message: String,
}

/// Queue a flash message for the next page.
pub fn flash(session: &dyn SessionStore, category: impl Into<String>, message: impl Into<String>) {
    let mut messages = peek_flash(session);
    messages.push(FlashMessage {
        category: category.into(),
        message: message.into(),
    });
    match serde_json::to_value(&messages) {
        Ok(value) => session.set(FLASH_KEY, value),
        Err(e) => tracing::warn!(error = %e, "Dropping unserializable flash message"),
    }
}

/// Pending flash messages, left in place.
pub fn peek_flash(session: &dyn SessionStore) -> Vec<FlashMessage> {
    session
        .get(FLASH_KEY)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Pending flash messages, removed from the session.
pub fn take_flash(session: &dyn SessionStore) -> Vec<FlashMessage> {
    session
        .remove(FLASH_KEY)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
