//! Page props subsystem.
//!
//! # Data Flow
//! ```text
//! Handler returns Props (key → Prop, declaration order kept)
//!     → shared.rs (startup registry merged in first, handler wins)
//!     → resolver.rs (partial-reload filter, full-load exclusions)
//!     → thunks evaluated once, only for surviving keys
//!     → ResolvedProps { props, deferred groups, merge keys }
//! ```
//!
//! # Design Decisions
//! - `Prop` is a closed enum; filtering is an exhaustive `match`
//! - Thunks are `FnOnce`, so "evaluated at most once" holds by construction
//! - Any `Serialize` value is accepted and converted through `serde_json`

pub mod resolver;
pub mod shared;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use resolver::{PropResolver, ResolvedProps};
pub use shared::SharedProps;

/// Group used by `defer` when none is named.
pub const DEFAULT_GROUP: &str = "default";

/// Errors raised while turning props into JSON.
#[derive(Debug, Error)]
pub enum PropError {
    /// A prop value could not be represented as JSON.
    #[error("prop `{key}` is not serializable: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

type Thunk = Box<dyn FnOnce() -> Result<Value, serde_json::Error> + Send>;

/// A prop value, either computed up front or on demand.
pub enum Resolvable {
    Value(Value),
    Lazy(Thunk),
}

impl Resolvable {
    pub fn lazy<F, T>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
        T: Serialize,
    {
        Resolvable::Lazy(Box::new(move || serde_json::to_value(f())))
    }

    pub fn value<T: Serialize>(value: T) -> Self {
        match serde_json::to_value(value) {
            Ok(v) => Resolvable::Value(v),
            // Defer the failure to resolution so it is reported with its key.
            Err(e) => Resolvable::Lazy(Box::new(move || Err(e))),
        }
    }

    pub(crate) fn resolve(self, key: &str) -> Result<Value, PropError> {
        match self {
            Resolvable::Value(v) => Ok(v),
            Resolvable::Lazy(f) => f().map_err(|source| PropError::Serialize {
                key: key.to_string(),
                source,
            }),
        }
    }
}

impl std::fmt::Debug for Resolvable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Resolvable::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Resolvable::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// A single page prop and its inclusion rules.
#[derive(Debug)]
pub enum Prop {
    /// Always sent, unless a partial reload leaves it out.
    Eager(Resolvable),
    /// Sent only when a partial reload asks for it.
    Optional(Resolvable),
    /// Left out of the first payload and advertised under `deferredProps`.
    Deferred {
        value: Resolvable,
        group: String,
        merge: bool,
    },
    /// Sent like an eager prop; the client merges it when `merge` is set.
    Mergeable { value: Resolvable, merge: bool },
}

impl Prop {
    pub fn eager<T: Serialize>(value: T) -> Self {
        Prop::Eager(Resolvable::value(value))
    }

    /// Put a deferred prop in another fetch group.
    pub fn group(self, name: impl Into<String>) -> Self {
        match self {
            Prop::Deferred { value, merge, .. } => Prop::Deferred {
                value,
                group: name.into(),
                merge,
            },
            other => other,
        }
    }

    /// Flag a deferred or mergeable prop for client-side merging.
    pub fn merge(self) -> Self {
        self.merge_flag(true)
    }

    pub fn merge_flag(self, merge: bool) -> Self {
        match self {
            Prop::Deferred { value, group, .. } => Prop::Deferred {
                value,
                group,
                merge,
            },
            Prop::Mergeable { value, .. } => Prop::Mergeable { value, merge },
            other => other,
        }
    }

    pub(crate) fn into_value(self) -> Resolvable {
        match self {
            Prop::Eager(value)
            | Prop::Optional(value)
            | Prop::Deferred { value, .. }
            | Prop::Mergeable { value, .. } => value,
        }
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Eager(Resolvable::Value(value))
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Prop::Eager(Resolvable::Value(Value::from(value)))
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Prop::Eager(Resolvable::Value(Value::from(value)))
    }
}

/// Defer a prop to a follow-up partial reload, in the `"default"` group.
pub fn defer<F, T>(f: F) -> Prop
where
    F: FnOnce() -> T + Send + 'static,
    T: Serialize,
{
    Prop::Deferred {
        value: Resolvable::lazy(f),
        group: DEFAULT_GROUP.to_string(),
        merge: false,
    }
}

/// A prop computed only when a partial reload requests it.
pub fn optional<F, T>(f: F) -> Prop
where
    F: FnOnce() -> T + Send + 'static,
    T: Serialize,
{
    Prop::Optional(Resolvable::lazy(f))
}

#[deprecated(note = "use `optional` instead")]
pub fn lazy<F, T>(f: F) -> Prop
where
    F: FnOnce() -> T + Send + 'static,
    T: Serialize,
{
    optional(f)
}

/// A value the client merges into its current state.
pub fn merge<T: Serialize>(value: T) -> Prop {
    Prop::Mergeable {
        value: Resolvable::value(value),
        merge: true,
    }
}

pub fn merge_lazy<F, T>(f: F) -> Prop
where
    F: FnOnce() -> T + Send + 'static,
    T: Serialize,
{
    Prop::Mergeable {
        value: Resolvable::lazy(f),
        merge: true,
    }
}

/// Props returned by a handler, in declaration order.
#[derive(Debug, Default)]
pub struct Props {
    entries: IndexMap<String, Prop>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.insert(key, prop);
        self
    }

    /// Insert or replace a prop. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, prop: impl Into<Prop>) {
        self.entries.insert(key.into(), prop.into());
    }

    pub fn get(&self, key: &str) -> Option<&Prop> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Prop)> {
        self.entries.iter()
    }

    /// Lay `self` over `base`: keys in `self` win, base ordering comes first.
    pub(crate) fn over(self, mut base: Props) -> Props {
        for (key, prop) in self.entries {
            base.entries.insert(key, prop);
        }
        base
    }
}

impl IntoIterator for Props {
    type Item = (String, Prop);
    type IntoIter = indexmap::map::IntoIter<String, Prop>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Prop)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, Prop)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
