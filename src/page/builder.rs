//! Page assembly.

use crate::page::Page;
use crate::props::ResolvedProps;
use crate::session::{take_clear_history, SessionStore};

/// History flags of one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryState {
    pub encrypt_history: bool,
    pub clear_history: bool,
}

impl HistoryState {
    /// Resolve both flags for the response being built.
    ///
    /// The clear flag is consumed from the session here, before any prop is
    /// resolved, so a later failure cannot leak it into another response.
    pub fn resolve(
        encrypt_override: Option<bool>,
        encrypt_default: bool,
        session: Option<&dyn SessionStore>,
    ) -> Self {
        Self {
            encrypt_history: encrypt_override.unwrap_or(encrypt_default),
            clear_history: session.map(take_clear_history).unwrap_or(false),
        }
    }
}

/// Builds a `Page` from its parts.
#[derive(Debug, Default)]
pub struct PageBuilder {
    component: String,
    url: String,
    version: String,
    history: HistoryState,
    resolved: ResolvedProps,
}

impl PageBuilder {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            ..Default::default()
        }
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn history(mut self, history: HistoryState) -> Self {
        self.history = history;
        self
    }

    pub fn props(mut self, resolved: ResolvedProps) -> Self {
        self.resolved = resolved;
        self
    }

    pub fn build(self) -> Page {
        Page {
            component: self.component,
            props: self.resolved.props,
            url: self.url,
            version: self.version,
            encrypt_history: self.history.encrypt_history,
            clear_history: self.history.clear_history,
            deferred_props: self.resolved.deferred_props,
            merge_props: self.resolved.merge_props,
        }
    }
}
