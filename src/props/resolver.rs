//! Prop filtering and resolution.
//!
//! # Responsibilities
//! - Partial reload of this component: keep exactly the requested keys
//! - Full load: drop optional and deferred props
//! - Advertise deferred keys by group (declaration order) on non-partial loads
//! - Collect merge keys among the props actually sent, minus reset keys
//!
//! # Design Decisions
//! - Deferred metadata is computed from the unfiltered props
//! - Thunks run after filtering, so dropped props cost nothing

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::http::request::RequestSignals;
use crate::props::{Prop, PropError, Props};

/// Outcome of resolving a handler's props for one request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolvedProps {
    /// Props shipped to the client.
    pub props: Map<String, Value>,
    /// Deferred keys by group, in declaration order.
    pub deferred_props: IndexMap<String, Vec<String>>,
    /// Keys the client should merge rather than replace.
    pub merge_props: Vec<String>,
}

/// Applies the inclusion rules for one component and request.
pub struct PropResolver<'a> {
    signals: &'a RequestSignals,
    component: &'a str,
}

impl<'a> PropResolver<'a> {
    pub fn new(signals: &'a RequestSignals, component: &'a str) -> Self {
        Self { signals, component }
    }

    pub fn resolve(&self, props: Props) -> Result<ResolvedProps, PropError> {
        let partial = self.signals.is_partial_render(self.component);
        if partial {
            tracing::debug!(
                component = %self.component,
                keys = ?self.signals.partial_keys(),
                "Partial reload"
            );
        }

        let deferred_props = if partial {
            IndexMap::new()
        } else {
            deferred_groups(&props)
        };

        let mut resolved = Map::new();
        let mut merge_props = Vec::new();

        for (key, prop) in props {
            if !self.retains(&key, &prop, partial) {
                continue;
            }

            if wants_merge(&prop) && !self.signals.reset_keys().contains(&key) {
                merge_props.push(key.clone());
            }

            let value = prop.into_value().resolve(&key)?;
            resolved.insert(key, value);
        }

        Ok(ResolvedProps {
            props: resolved,
            deferred_props,
            merge_props,
        })
    }

    fn retains(&self, key: &str, prop: &Prop, partial: bool) -> bool {
        if partial {
            return self.signals.partial_keys().contains(key);
        }

        match prop {
            Prop::Eager(_) | Prop::Mergeable { .. } => true,
            Prop::Optional(_) | Prop::Deferred { .. } => false,
        }
    }
}

fn wants_merge(prop: &Prop) -> bool {
    match prop {
        Prop::Mergeable { merge, .. } | Prop::Deferred { merge, .. } => *merge,
        Prop::Eager(_) | Prop::Optional(_) => false,
    }
}

fn deferred_groups(props: &Props) -> IndexMap<String, Vec<String>> {
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, prop) in props.iter() {
        if let Prop::Deferred { group, .. } = prop {
            groups.entry(group.clone()).or_default().push(key.clone());
        }
    }
    groups
}
