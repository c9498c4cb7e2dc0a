//! Protocol-level errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::config::ConfigError;
use crate::props::PropError;
use crate::template::TemplateError;
use crate::version::VersionError;

/// Errors surfaced by the Inertia layer to the enclosing handler.
#[derive(Debug, Error)]
pub enum InertiaError {
    /// An XHR request arrived without the `X-Inertia` header.
    #[error("Inertia headers not found")]
    MalformedRequest,

    /// A required setting (version source, template) is absent.
    #[error("missing configuration: {0}")]
    MissingConfiguration(&'static str),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("asset version error: {0}")]
    Version(#[from] VersionError),

    #[error(transparent)]
    Prop(#[from] PropError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("page serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("asset watcher failed: {0}")]
    Watch(#[from] notify::Error),
}

impl InertiaError {
    pub fn status(&self) -> StatusCode {
        match self {
            InertiaError::MalformedRequest => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for InertiaError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Inertia response failed");
            (status, "Internal Server Error").into_response()
        } else {
            tracing::debug!(error = %self, "Rejected request");
            (status, self.to_string()).into_response()
        }
    }
}
