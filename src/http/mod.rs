//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → middleware.rs (malformed check, GET version check, 409 short-circuit)
//!     → request.rs (RequestSignals, stored in extensions)
//!     → handler (InertiaRequest extractor → props)
//!     → response.rs (JSON or HTML, headers, status)
//!     → middleware.rs (301/302 → 303 after PUT/PATCH/DELETE)
//!     → Send to client
//! ```

pub mod headers;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::inertia_middleware;
pub use request::RequestSignals;
pub use response::{location, version_conflict};
pub use server::HttpServer;
