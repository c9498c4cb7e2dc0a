//! Shared utilities for integration tests.

use std::io::Write;
use std::net::SocketAddr;

use inertia_axum::{AppConfig, HttpServer, Shutdown};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::net::TcpListener;

/// A demo server bound to an ephemeral port, stopped on drop.
pub struct TestServer {
    pub addr: SocketAddr,
    pub version: String,
    pub client: reqwest::Client,
    shutdown: Shutdown,
    _template: NamedTempFile,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// GET as the Inertia client would, with the current asset version.
    pub fn visit(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .header("X-Inertia", "true")
            .header("X-Inertia-Version", &self.version)
            .header("X-Requested-With", "XMLHttpRequest")
    }

    /// Partial reload of `component` asking for `keys`.
    pub fn partial(&self, path: &str, component: &str, keys: &str) -> reqwest::RequestBuilder {
        self.visit(path)
            .header("X-Inertia-Partial-Component", component)
            .header("X-Inertia-Partial-Data", keys)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Start the demo app on 127.0.0.1 with a throwaway root template.
pub async fn start_server() -> TestServer {
    let mut template = NamedTempFile::new().unwrap();
    write!(
        template,
        "<html><head><title>{{{{ title }}}}</title></head><body>@inertia</body></html>"
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.inertia.template_path = Some(template.path().to_path_buf());

    let server = HttpServer::new(config).unwrap();
    let version = server.inertia().version().to_string();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestServer {
        addr,
        version,
        client,
        shutdown,
        _template: template,
    }
}

/// Extract and decode the `data-page` attribute of a first-load document.
pub fn page_from_html(html: &str) -> Value {
    let start = html.find("data-page=\"").expect("data-page attribute") + "data-page=\"".len();
    let end = start + html[start..].find('"').expect("closing quote");
    let json = html[start..end]
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&");
    serde_json::from_str(&json).unwrap()
}

/// The `name=value` pair of the first Set-Cookie header.
pub fn session_cookie(response: &reqwest::Response) -> String {
    let raw = response
        .headers()
        .get("set-cookie")
        .expect("session cookie")
        .to_str()
        .unwrap();
    raw.split(';').next().unwrap().to_string()
}
