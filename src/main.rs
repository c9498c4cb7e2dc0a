//! Inertia Axum demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client ──▶ session ──▶ inertia middleware ──▶ handler ──▶ InertiaRequest::render
//!                           │  400 malformed XHR              │
//!                           │  409 stale GET                  ├─ PropResolver
//!                           │  303 redirect fix               ├─ PageBuilder
//!                           ▼                                 └─ Negotiation (JSON | HTML)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use inertia_axum::config::{load_config, validation::validate_config, AppConfig, ConfigError};
use inertia_axum::lifecycle::{signals::wait_for_signal, Shutdown};
use inertia_axum::observability::{logging, metrics};
use inertia_axum::HttpServer;

#[derive(Parser)]
#[command(name = "inertia-axum")]
#[command(about = "Demo server for the Inertia.js protocol on Axum", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let config = AppConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("inertia-axum v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        template = ?config.inertia.template_path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let watch_assets = config.inertia.watch_assets;
    let server = HttpServer::new(config)?;

    // Dropping the watcher stops it, so hold it until shutdown.
    let _watcher = if watch_assets {
        Some(server.inertia().watch_assets()?)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
