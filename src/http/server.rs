//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router for the demo Inertia app
//! - Wire up middleware (tracing, timeout, request ID, session, Inertia)
//! - Bind server to listener with graceful shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{FromRef, Path, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::error::InertiaError;
use crate::http::middleware::inertia_middleware;
use crate::http::response::location;
use crate::inertia::{Inertia, InertiaRequest, Outcome};
use crate::props::{defer, merge, optional, Props};
use crate::session::{session_middleware, MemorySessionStore};

/// A user record of the demo app.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub name: String,
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inertia: Inertia,
    pub users: Arc<DashMap<u64, User>>,
}

impl FromRef<AppState> for Inertia {
    fn from_ref(state: &AppState) -> Inertia {
        state.inertia.clone()
    }
}

/// HTTP server for the demo app.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    inertia: Inertia,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig) -> Result<Self, InertiaError> {
        let inertia = Inertia::builder()
            .config(&config.inertia)
            .share("app", json!({ "name": "Inertia Axum Demo" }))
            .build()?;
        Ok(Self::with_inertia(config, inertia))
    }

    /// Create a server around an already built `Inertia`.
    pub fn with_inertia(config: AppConfig, inertia: Inertia) -> Self {
        let sessions = MemorySessionStore::with_cookie_name(config.session.cookie_name.clone());
        let state = AppState {
            inertia: inertia.clone(),
            users: Arc::new(seed_users()),
        };

        let router = Self::build_router(&config, state, sessions);
        Self {
            router,
            config,
            inertia,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState, sessions: MemorySessionStore) -> Router {
        Router::new()
            .route("/", get(home))
            .route("/users", get(users_index))
            .route("/users/{id}", get(users_show).patch(users_update).delete(users_delete))
            .route("/logout", post(logout))
            .route("/about", Inertia::page("About"))
            .route("/docs", get(docs))
            .route("/export", get(export))
            .layer(middleware::from_fn_with_state(
                state.inertia.clone(),
                inertia_middleware,
            ))
            .layer(middleware::from_fn_with_state(sessions, session_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            version = %self.inertia.version(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn inertia(&self) -> &Inertia {
        &self.inertia
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

fn seed_users() -> DashMap<u64, User> {
    let users = DashMap::new();
    for (id, name) in [(1, "Alice"), (2, "Bob"), (3, "Carol")] {
        users.insert(
            id,
            User {
                id,
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            },
        );
    }
    users
}

fn sorted_users(users: &DashMap<u64, User>) -> Vec<User> {
    let mut list: Vec<User> = users.iter().map(|r| r.value().clone()).collect();
    list.sort_by_key(|u| u.id);
    list
}

fn found(to: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, to.to_string())]).into_response()
}

async fn home(inertia: InertiaRequest) -> Result<Response, InertiaError> {
    inertia
        .with_view_data("title", "Home")
        .render("Home", Props::new().with("greeting", "Welcome"))
}

async fn users_index(
    State(state): State<AppState>,
    inertia: InertiaRequest,
) -> Result<Response, InertiaError> {
    let users = sorted_users(&state.users);
    let count = users.len();
    let names: Vec<String> = users.iter().map(|u| u.name.clone()).collect();

    let props = Props::new()
        .with("users", merge(&users))
        .with("teams", optional(|| vec!["core", "docs"]))
        .with("stats", defer(move || json!({ "total": count })).group("stats"))
        .with("activity", defer(move || names).group("stats"))
        .with("permissions", defer(|| vec!["users.edit"]));

    inertia
        .with_view_data("title", "Users")
        .render("Users/Index", props)
}

async fn users_show(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    inertia: InertiaRequest,
) -> Result<Response, InertiaError> {
    let Some(user) = state.users.get(&id).map(|r| r.value().clone()) else {
        return Ok((StatusCode::NOT_FOUND, "User not found").into_response());
    };

    let email = user.email.clone();
    let props = Props::new()
        .with("id", json!(user.id))
        .with("name", user.name)
        .with("email", defer(move || email));

    inertia.render("Users/Show", props)
}

async fn users_update(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    inertia: InertiaRequest,
    Json(update): Json<UpdateUser>,
) -> Result<Response, InertiaError> {
    match state.users.get_mut(&id) {
        Some(mut user) => {
            user.name = update.name;
            inertia.flash("success", "User updated");
            Ok(found("/users"))
        }
        None => Ok((StatusCode::NOT_FOUND, "User not found").into_response()),
    }
}

async fn users_delete(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    inertia: InertiaRequest,
) -> Result<Response, InertiaError> {
    let outcome: Outcome = match state.users.remove(&id) {
        Some(_) => {
            inertia.flash("success", "User deleted");
            found("/users").into()
        }
        None => (StatusCode::NOT_FOUND, "User not found").into_response().into(),
    };
    inertia.respond("Users/Index", outcome)
}

async fn logout(inertia: InertiaRequest) -> Response {
    inertia.clear_history();
    found("/")
}

async fn docs() -> Response {
    location("https://inertiajs.com")
}

/// Raw responses pass through the Inertia layer untouched.
async fn export(
    State(state): State<AppState>,
    inertia: InertiaRequest,
) -> Result<Response, InertiaError> {
    let csv = sorted_users(&state.users)
        .iter()
        .map(|u| format!("{},{},{}", u.id, u.name, u.email))
        .collect::<Vec<_>>()
        .join("\n");
    let raw = ([(header::CONTENT_TYPE, "text/csv")], csv).into_response();
    inertia.respond("Users/Export", raw)
}
