//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::version::VersionStrategy;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Inertia protocol settings.
    pub inertia: InertiaConfig,

    /// Session cookie settings.
    pub session: SessionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Inertia protocol settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct InertiaConfig {
    /// Root HTML template containing the `@inertia` placeholder.
    pub template_path: Option<PathBuf>,

    /// Fixed asset version. When unset the template hash is used.
    pub version: Option<String>,

    /// `id` of the element the client mounts on.
    pub root_id: String,

    /// Default for `encryptHistory` when a handler does not override it.
    pub encrypt_history: bool,

    /// Recompute the version and reload the template when the file changes.
    pub watch_assets: bool,
}

impl Default for InertiaConfig {
    fn default() -> Self {
        Self {
            template_path: Some(PathBuf::from("demos/templates/app.html")),
            version: None,
            root_id: "app".to_string(),
            encrypt_history: false,
            watch_assets: false,
        }
    }
}

impl InertiaConfig {
    /// The version strategy implied by this configuration.
    ///
    /// Returns `None` when neither a static version nor a template is set.
    pub fn version_strategy(&self) -> Option<VersionStrategy> {
        match (&self.version, &self.template_path) {
            (Some(v), _) => Some(VersionStrategy::Static(v.clone())),
            (None, Some(path)) => Some(VersionStrategy::TemplateHash(path.clone())),
            (None, None) => None,
        }
    }
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session id.
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: crate::session::memory::DEFAULT_COOKIE.to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
