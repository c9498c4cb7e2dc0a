//! First-load HTML rendering.
//!
//! # Responsibilities
//! - Embed the serialized page object into the root template
//! - Substitute template-only view data
//!
//! # Design Decisions
//! - Rendering sits behind `TemplateRenderer`; hosts may plug a real engine
//! - `HtmlTemplate` understands two placeholders only: `@inertia` and `{{ key }}`
//! - All substituted text is HTML-escaped

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{Map, Value};
use thiserror::Error;

/// Placeholder replaced by the root element carrying the page.
pub const INERTIA_PLACEHOLDER: &str = "@inertia";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template `{0}` is not registered")]
    NotFound(String),

    #[error("template `{path}` is unreadable: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template `{0}` has no `@inertia` placeholder")]
    MissingPlaceholder(String),
}

/// Turns a page into a full HTML document.
pub trait TemplateRenderer: Send + Sync {
    fn render(
        &self,
        template: &str,
        page_json: &str,
        view_data: &Map<String, Value>,
    ) -> Result<String, TemplateError>;

    /// Re-read template sources after they changed on disk.
    fn reload(&self) -> Result<(), TemplateError> {
        Ok(())
    }
}

/// A single HTML file used as the root template.
#[derive(Debug)]
pub struct HtmlTemplate {
    name: String,
    path: PathBuf,
    root_id: String,
    source: ArcSwap<String>,
}

impl HtmlTemplate {
    /// Load the template; its registered name is the file name.
    pub fn load(path: &Path, root_id: impl Into<String>) -> Result<Self, TemplateError> {
        let source = read_template(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: path.to_path_buf(),
            root_id: root_id.into(),
            source: ArcSwap::from_pointee(source),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TemplateRenderer for HtmlTemplate {
    fn render(
        &self,
        template: &str,
        page_json: &str,
        view_data: &Map<String, Value>,
    ) -> Result<String, TemplateError> {
        if template != self.name {
            return Err(TemplateError::NotFound(template.to_string()));
        }

        let source = self.source.load();
        let root = format!(
            r#"<div id="{}" data-page="{}"></div>"#,
            escape_html(&self.root_id),
            escape_html(page_json)
        );

        Ok(fill(&source, &root, view_data))
    }

    fn reload(&self) -> Result<(), TemplateError> {
        let source = read_template(&self.path)?;
        self.source.store(Arc::new(source));
        tracing::debug!(template = %self.name, "Template reloaded");
        Ok(())
    }
}

fn read_template(path: &Path) -> Result<String, TemplateError> {
    let source = std::fs::read_to_string(path).map_err(|source| TemplateError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    if !source.contains(INERTIA_PLACEHOLDER) {
        return Err(TemplateError::MissingPlaceholder(path.display().to_string()));
    }
    Ok(source)
}

/// Single left-to-right pass over the template source.
///
/// Only the source is scanned for placeholders; substituted text is copied
/// as is, so view data can never expand into another placeholder. The first
/// `@inertia` receives `root`. Unknown `{{ key }}` tags are left literal.
fn fill(source: &str, root: &str, view_data: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(source.len() + root.len());
    let mut rest = source;
    let mut placed = false;

    loop {
        let tag = rest.find("{{");
        let placeholder = if placed {
            None
        } else {
            rest.find(INERTIA_PLACEHOLDER)
        };

        let root_next = match (tag, placeholder) {
            (Some(t), Some(p)) => (p < t).then_some(p),
            (None, Some(p)) => Some(p),
            _ => None,
        };
        if let Some(p) = root_next {
            out.push_str(&rest[..p]);
            out.push_str(root);
            placed = true;
            rest = &rest[p + INERTIA_PLACEHOLDER.len()..];
            continue;
        }

        let Some(t) = tag else {
            out.push_str(rest);
            return out;
        };
        out.push_str(&rest[..t]);
        let inner = &rest[t + 2..];
        let value = inner
            .find("}}")
            .and_then(|end| view_data.get(inner[..end].trim()).map(|v| (end, v)));
        match value {
            Some((end, value)) => {
                out.push_str(&escape_html(&view_text(value)));
                rest = &inner[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = inner;
            }
        }
    }
}

fn view_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn template(contents: &str) -> (tempfile::NamedTempFile, HtmlTemplate) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", contents).unwrap();
        let tpl = HtmlTemplate::load(file.path(), "app").unwrap();
        (file, tpl)
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"{"a":"<b>&'"}"#),
            "{&quot;a&quot;:&quot;&lt;b&gt;&amp;&#39;&quot;}"
        );
    }

    #[test]
    fn test_render_embeds_page() {
        let (_file, tpl) = template("<title>{{ title }}</title><body>@inertia</body>");
        let mut view = Map::new();
        view.insert("title".into(), json!("Users & Teams"));

        let html = tpl.render(tpl.name(), r#"{"component":"Home"}"#, &view).unwrap();
        assert_eq!(
            html,
            "<title>Users &amp; Teams</title><body><div id=\"app\" \
             data-page=\"{&quot;component&quot;:&quot;Home&quot;}\"></div></body>"
        );
    }

    #[test]
    fn test_view_data_is_not_rescanned() {
        let (_file, tpl) =
            template("<title>{{ title }}</title><p>{{other}} {{ missing }}</p><body>@inertia</body>");
        let mut view = Map::new();
        view.insert("title".into(), json!("Follow @inertia {{ other }}"));
        view.insert("other".into(), json!(42));

        let html = tpl.render(tpl.name(), "{}", &view).unwrap();
        assert_eq!(
            html,
            "<title>Follow @inertia {{ other }}</title><p>42 {{ missing }}</p>\
             <body><div id=\"app\" data-page=\"{}\"></div></body>"
        );
    }

    #[test]
    fn test_only_first_placeholder_is_replaced() {
        let (_file, tpl) = template("<main>@inertia</main><pre>@inertia</pre>");
        let html = tpl.render(tpl.name(), "{}", &Map::new()).unwrap();
        assert_eq!(
            html,
            "<main><div id=\"app\" data-page=\"{}\"></div></main><pre>@inertia</pre>"
        );
    }

    #[test]
    fn test_unknown_template() {
        let (_file, tpl) = template("@inertia");
        let err = tpl.render("other.html", "{}", &Map::new()).unwrap_err();
        assert!(matches!(err, TemplateError::NotFound(_)));
    }

    #[test]
    fn test_missing_placeholder() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<html></html>").unwrap();
        let err = HtmlTemplate::load(file.path(), "app").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder(_)));
    }

    #[test]
    fn test_reload_picks_up_changes() {
        let (mut file, tpl) = template("<main>@inertia</main>");
        write!(file, "<footer>v2</footer>").unwrap();
        file.flush().unwrap();
        tpl.reload().unwrap();

        let html = tpl.render(tpl.name(), "{}", &Map::new()).unwrap();
        assert!(html.ends_with("<footer>v2</footer>"));
    }
}
