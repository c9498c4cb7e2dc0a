//! The Inertia page object.
//!
//! # Data Flow
//! ```text
//! component + ResolvedProps + RequestSignals.full_path
//!     + AssetVersion.current() + HistoryState
//!     → builder.rs (PageBuilder)
//!     → Page (serialized once, sent as JSON or embedded in HTML)
//! ```
//!
//! # Design Decisions
//! - Wire key names are fixed by serde renames
//! - `deferredProps` / `mergeProps` are omitted when empty, never sent as `{}`/`[]`

pub mod builder;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use builder::{HistoryState, PageBuilder};

/// The payload the client-side adapter mounts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub component: String,
    pub props: Map<String, Value>,
    pub url: String,
    pub version: String,
    pub encrypt_history: bool,
    pub clear_history: bool,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub deferred_props: IndexMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub merge_props: Vec<String>,
}

impl Page {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Page {
        Page {
            component: "Home".into(),
            props: json!({"name": "Alice"}).as_object().cloned().unwrap(),
            url: "/".into(),
            version: "v1".into(),
            encrypt_history: false,
            clear_history: false,
            deferred_props: IndexMap::new(),
            merge_props: Vec::new(),
        }
    }

    #[test]
    fn test_wire_shape_omits_empty_metadata() {
        let value = serde_json::to_value(page()).unwrap();
        assert_eq!(
            value,
            json!({
                "component": "Home",
                "props": {"name": "Alice"},
                "url": "/",
                "version": "v1",
                "encryptHistory": false,
                "clearHistory": false,
            })
        );
    }

    #[test]
    fn test_wire_shape_with_metadata() {
        let mut page = page();
        page.deferred_props.insert("default".into(), vec!["email".into()]);
        page.merge_props.push("posts".into());

        let value = serde_json::to_value(page).unwrap();
        assert_eq!(value["deferredProps"], json!({"default": ["email"]}));
        assert_eq!(value["mergeProps"], json!(["posts"]));
    }

    #[test]
    fn test_key_order_is_stable() {
        let json = page().to_json().unwrap();
        assert!(json.starts_with(r#"{"component":"Home","props":"#));
    }
}
