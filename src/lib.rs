//! Server-side Inertia.js protocol for Axum.
//!
//! Handlers return props; this crate decides which of them to compute and
//! ship, and whether the client gets a JSON page, a full HTML document, a
//! version conflict or a corrected redirect.
//!
//! ```ignore
//! use axum::{middleware, routing::get, Router};
//! use inertia_axum::{defer, inertia_middleware, Inertia, InertiaRequest, Props};
//!
//! async fn show(inertia: InertiaRequest) -> Result<axum::response::Response, inertia_axum::InertiaError> {
//!     inertia.render(
//!         "Users/Show",
//!         Props::new()
//!             .with("name", "Alice")
//!             .with("email", defer(|| "alice@example.com")),
//!     )
//! }
//!
//! let inertia = Inertia::builder().template_path("templates/app.html").build()?;
//! let app: Router = Router::new()
//!     .route("/users/1", get(show))
//!     .layer(middleware::from_fn_with_state(inertia.clone(), inertia_middleware))
//!     .with_state(inertia);
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod inertia;
pub mod lifecycle;
pub mod observability;
pub mod page;
pub mod props;
pub mod session;
pub mod template;
pub mod version;

pub use config::AppConfig;
pub use error::InertiaError;
pub use http::{inertia_middleware, location, HttpServer, RequestSignals};
pub use inertia::{Inertia, InertiaBuilder, InertiaRequest, Outcome};
pub use lifecycle::Shutdown;
pub use page::Page;
#[allow(deprecated)]
pub use props::{defer, lazy, merge, merge_lazy, optional, Prop, Props};
pub use session::{Session, SessionStore};
pub use version::{AssetVersion, VersionStrategy};
