//! Props shared by every page.
//!
//! Registered once while building the `Inertia` state. After `build()` the
//! registry sits behind an `Arc` with no mutation API, so request handlers
//! only ever read it.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::Value;

use crate::props::{Prop, Props, Resolvable};

type SharedFn = Arc<dyn Fn() -> Result<Value, serde_json::Error> + Send + Sync>;

#[derive(Clone)]
enum SharedValue {
    Static(Value),
    Computed(SharedFn),
    Invalid(Arc<String>),
}

/// Startup registry of props merged into every page.
#[derive(Clone, Default)]
pub struct SharedProps {
    entries: IndexMap<String, SharedValue>,
}

impl SharedProps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share a fixed value.
    ///
    /// A value that fails to serialize is kept as its error and reported as a
    /// `PropError` for its key on every page that ships it.
    pub fn insert<T: Serialize>(&mut self, key: impl Into<String>, value: T) {
        let key = key.into();
        let entry = match serde_json::to_value(value) {
            Ok(v) => SharedValue::Static(v),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Shared prop is not serializable");
                SharedValue::Invalid(Arc::new(e.to_string()))
            }
        };
        self.entries.insert(key, entry);
    }

    /// Share a value computed on each request that ships it.
    pub fn insert_with<F, T>(&mut self, key: impl Into<String>, f: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Serialize,
    {
        let f: SharedFn = Arc::new(move || serde_json::to_value(f()));
        self.entries.insert(key.into(), SharedValue::Computed(f));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Materialize the registry as eager props for one request.
    pub fn to_props(&self) -> Props {
        self.entries
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    SharedValue::Static(v) => Resolvable::Value(v.clone()),
                    SharedValue::Computed(f) => {
                        let f = f.clone();
                        Resolvable::Lazy(Box::new(move || f()))
                    }
                    SharedValue::Invalid(msg) => {
                        let msg = msg.clone();
                        Resolvable::Lazy(Box::new(move || {
                            Err(serde_json::Error::custom(msg))
                        }))
                    }
                };
                (key.clone(), Prop::Eager(value))
            })
            .collect()
    }
}

impl std::fmt::Debug for SharedProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.entries.keys()).finish()
    }
}
