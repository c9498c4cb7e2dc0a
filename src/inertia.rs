//! Handler-facing entry points.
//!
//! # Data Flow
//! ```text
//! startup: AppConfig / builder → Inertia (immutable, Arc-shared)
//!
//! per request:
//!     InertiaRequest extractor (signals + session + overrides)
//!     → handler returns Outcome
//!         Raw(Response)  → passed through untouched
//!         Props(Props)   → shared props merged under handler props
//!                        → HistoryState (clear flag consumed first)
//!                        → PropResolver → PageBuilder → Negotiation
//! ```
//!
//! # Design Decisions
//! - Shared props and defaults are fixed at `build()`; no global lookups
//! - A stale GET is answered with 409 before any prop is resolved

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, MethodRouter},
};
use notify::RecommendedWatcher;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::InertiaConfig;
use crate::error::InertiaError;
use crate::http::request::RequestSignals;
use crate::http::response::{version_conflict, Negotiation};
use crate::observability::metrics;
use crate::page::{HistoryState, PageBuilder};
use crate::props::{Prop, PropResolver, Props, Resolvable, SharedProps};
use crate::session::{flag_clear_history, flash, peek_flash, take_flash, Session};
use crate::template::{HtmlTemplate, TemplateRenderer};
use crate::version::{AssetVersion, VersionStrategy, VersionWatcher};

/// Prop key under which pending flash messages are shipped.
pub const FLASH_PROP: &str = "flash";

struct Inner {
    version: AssetVersion,
    shared: SharedProps,
    renderer: Arc<dyn TemplateRenderer>,
    template: String,
    template_path: Option<PathBuf>,
    encrypt_history: bool,
}

/// Process-wide Inertia state, built once at startup.
#[derive(Clone)]
pub struct Inertia {
    inner: Arc<Inner>,
}

impl Inertia {
    pub fn builder() -> InertiaBuilder {
        InertiaBuilder::default()
    }

    /// Build from the `[inertia]` config section.
    pub fn from_config(config: &InertiaConfig) -> Result<Self, InertiaError> {
        Self::builder().config(config).build()
    }

    /// The asset version currently served.
    pub fn version(&self) -> Arc<String> {
        self.inner.version.current()
    }

    pub fn is_stale(&self, requested: Option<&str>) -> bool {
        self.inner.version.is_stale(requested)
    }

    pub fn encrypt_history_default(&self) -> bool {
        self.inner.encrypt_history
    }

    pub fn shared(&self) -> &SharedProps {
        &self.inner.shared
    }

    /// Recompute the asset version and reload the template.
    pub fn refresh_assets(&self) -> Result<bool, InertiaError> {
        self.inner.renderer.reload()?;
        Ok(self.inner.version.refresh()?)
    }

    /// Watch the root template and refresh assets when it changes.
    ///
    /// Keep the returned watcher alive for as long as refreshes are wanted.
    pub fn watch_assets(&self) -> Result<RecommendedWatcher, InertiaError> {
        let path = self
            .inner
            .template_path
            .clone()
            .ok_or(InertiaError::MissingConfiguration("inertia.template_path"))?;
        let inertia = self.clone();
        let watcher = VersionWatcher::new(&path).run(move || {
            if let Err(e) = inertia.refresh_assets() {
                tracing::error!(error = %e, "Asset refresh failed. Keeping current version.");
            }
        })?;
        Ok(watcher)
    }

    /// GET route rendering `component` without props.
    pub fn page<S>(component: &'static str) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
        Inertia: FromRef<S>,
    {
        get(move |inertia: InertiaRequest| async move { inertia.render(component, Props::new()) })
    }
}

impl std::fmt::Debug for Inertia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inertia")
            .field("version", &self.inner.version.current())
            .field("template", &self.inner.template)
            .field("shared", &self.inner.shared)
            .field("encrypt_history", &self.inner.encrypt_history)
            .finish()
    }
}

/// Startup builder for `Inertia`.
#[derive(Default)]
pub struct InertiaBuilder {
    version: Option<VersionStrategy>,
    template_path: Option<PathBuf>,
    root_id: Option<String>,
    renderer: Option<(String, Arc<dyn TemplateRenderer>)>,
    shared: SharedProps,
    encrypt_history: bool,
}

impl InertiaBuilder {
    pub fn config(mut self, config: &InertiaConfig) -> Self {
        self.version = config.version_strategy();
        self.template_path = config.template_path.clone();
        self.root_id = Some(config.root_id.clone());
        self.encrypt_history = config.encrypt_history;
        self
    }

    pub fn version(mut self, strategy: VersionStrategy) -> Self {
        self.version = Some(strategy);
        self
    }

    /// Root template file; also the default version source.
    pub fn template_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_path = Some(path.into());
        self
    }

    pub fn root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    /// Use a custom renderer instead of `HtmlTemplate`.
    pub fn renderer<R>(mut self, template: impl Into<String>, renderer: R) -> Self
    where
        R: TemplateRenderer + 'static,
    {
        self.renderer = Some((template.into(), Arc::new(renderer)));
        self
    }

    pub fn encrypt_history(mut self, encrypt: bool) -> Self {
        self.encrypt_history = encrypt;
        self
    }

    /// Share a value with every page.
    pub fn share<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        self.shared.insert(key, value);
        self
    }

    /// Share a value computed for every page that ships it.
    pub fn share_with<F, T>(mut self, key: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        self.shared.insert_with(key, f);
        self
    }

    pub fn build(self) -> Result<Inertia, InertiaError> {
        let strategy = match (self.version, &self.template_path) {
            (Some(strategy), _) => strategy,
            (None, Some(path)) => VersionStrategy::TemplateHash(path.clone()),
            (None, None) => return Err(InertiaError::MissingConfiguration("asset version source")),
        };
        let version = AssetVersion::new(strategy)?;

        let (template, renderer) = match (self.renderer, &self.template_path) {
            (Some(custom), _) => custom,
            (None, Some(path)) => {
                let root_id = self.root_id.unwrap_or_else(|| "app".to_string());
                let html = HtmlTemplate::load(path, root_id)?;
                let name = html.name().to_string();
                (name, Arc::new(html) as Arc<dyn TemplateRenderer>)
            }
            (None, None) => return Err(InertiaError::MissingConfiguration("inertia.template_path")),
        };

        tracing::info!(
            template = %template,
            shared_props = self.shared.len(),
            encrypt_history = self.encrypt_history,
            "Inertia initialized"
        );

        Ok(Inertia {
            inner: Arc::new(Inner {
                version,
                shared: self.shared,
                renderer,
                template,
                template_path: self.template_path,
                encrypt_history: self.encrypt_history,
            }),
        })
    }
}

/// What a handler hands back: props to render, or a finished response.
pub enum Outcome {
    Props(Props),
    Raw(Response),
}

impl From<Props> for Outcome {
    fn from(props: Props) -> Self {
        Outcome::Props(props)
    }
}

impl From<Response> for Outcome {
    fn from(response: Response) -> Self {
        Outcome::Raw(response)
    }
}

impl From<Redirect> for Outcome {
    fn from(redirect: Redirect) -> Self {
        Outcome::Raw(redirect.into_response())
    }
}

/// Per-request handle used by handlers to produce Inertia responses.
pub struct InertiaRequest {
    inertia: Inertia,
    signals: RequestSignals,
    session: Option<Session>,
    encrypt_history: Option<bool>,
    status: StatusCode,
    headers: HeaderMap,
    view_data: Map<String, Value>,
}

impl<S> FromRequestParts<S> for InertiaRequest
where
    Inertia: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = InertiaError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let signals = parts
            .extensions
            .get::<RequestSignals>()
            .cloned()
            .unwrap_or_else(|| RequestSignals::from_parts(parts));

        if signals.is_malformed() {
            metrics::record_malformed_request();
            return Err(InertiaError::MalformedRequest);
        }

        Ok(Self {
            inertia: Inertia::from_ref(state),
            signals,
            session: parts.extensions.get::<Session>().cloned(),
            encrypt_history: None,
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            view_data: Map::new(),
        })
    }
}

impl InertiaRequest {
    pub fn signals(&self) -> &RequestSignals {
        &self.signals
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Override the configured `encryptHistory` default for this response.
    pub fn encrypt_history(mut self, encrypt: bool) -> Self {
        self.encrypt_history = Some(encrypt);
        self
    }

    /// Clear client history on the next rendered page.
    pub fn clear_history(self) -> Self {
        match &self.session {
            Some(session) => flag_clear_history(session.as_ref()),
            None => tracing::warn!("clear_history called without a session; ignored"),
        }
        self
    }

    /// Queue a flash message for the next rendered page.
    pub fn flash(&self, category: impl Into<String>, message: impl Into<String>) {
        match &self.session {
            Some(session) => flash(session.as_ref(), category, message),
            None => tracing::warn!("flash called without a session; ignored"),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Data for the root template only; never sent to the client.
    pub fn with_view_data<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Self {
        let key = key.into();
        match serde_json::to_value(value) {
            Ok(v) => {
                self.view_data.insert(key, v);
            }
            Err(e) => tracing::warn!(key = %key, error = %e, "View data is not serializable"),
        }
        self
    }

    /// Pass raw responses through; render props as `component`.
    pub fn respond(
        self,
        component: &str,
        outcome: impl Into<Outcome>,
    ) -> Result<Response, InertiaError> {
        match outcome.into() {
            Outcome::Props(props) => self.render(component, props),
            Outcome::Raw(response) => Ok(response),
        }
    }

    pub fn render(self, component: &str, props: Props) -> Result<Response, InertiaError> {
        let inner = &self.inertia.inner;

        if *self.signals.method() == Method::GET
            && inner.version.is_stale(self.signals.requested_version())
        {
            tracing::debug!(path = %self.signals.full_path(), "Stale asset version");
            return Ok(version_conflict(self.signals.full_path()));
        }

        let history = HistoryState::resolve(
            self.encrypt_history,
            inner.encrypt_history,
            self.session.as_deref(),
        );

        let mut props = props.over(inner.shared.to_props());
        if let Some(session) = &self.session {
            if !props.contains_key(FLASH_PROP) && !peek_flash(session.as_ref()).is_empty() {
                let session = session.clone();
                let messages = Resolvable::lazy(move || take_flash(session.as_ref()));
                props.insert(FLASH_PROP, Prop::Eager(messages));
            }
        }

        let resolved = PropResolver::new(&self.signals, component).resolve(props)?;
        let page = PageBuilder::new(component)
            .url(self.signals.full_path())
            .version(inner.version.current().as_str())
            .history(history)
            .props(resolved)
            .build();

        Negotiation {
            signals: &self.signals,
            renderer: inner.renderer.as_ref(),
            template: &inner.template,
            view_data: &self.view_data,
            status: self.status,
            headers: self.headers,
        }
        .respond(&page)
    }
}
