//! bootcfg server
//!
//! Matches machines to Groups by label selector, resolves their Profile and
//! serves boot payloads over HTTP.
//!
//! # Endpoints
//!
//! | Path | Payload |
//! |---|---|
//! | `/boot.ipxe`, `/boot.ipxe.0` | iPXE script that chains back with labels |
//! | `/ipxe` | iPXE boot script |
//! | `/pixiecore/v1/boot/{mac}` | Pixiecore API JSON |
//! | `/ignition` | Ignition config (JSON) |
//! | `/cloud` | Cloud-Config or script user-data |
//! | `/generic` | Generic rendered template |
//! | `/metadata` | `KEY=value` metadata |
//!
//! Labels are taken from query parameters. Any failure to match, resolve,
//! render or validate is a 404.

use anyhow::Context;
use axum::Router;
use std::net::SocketAddr;
use std::path::PathBuf;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod api;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod server;
pub mod store;

#[cfg(test)]
pub mod test_helpers;

pub use api::AppState;
pub use context::RenderContext;
pub use error::{BootcfgError, ErrorKind, Result};
pub use render::{Fragments, RenderError, TemplateSource};
pub use server::Server;
pub use store::{create_store, FileStore, MemoryStore, Store, StoreConfig, StoreError};

/// Server process configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address
    pub address: SocketAddr,

    /// Backing store
    pub store: StoreConfig,

    /// Directory served read-only under `/assets`
    pub assets_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            store: StoreConfig::Memory,
            assets_path: None,
        }
    }
}

impl ServerConfig {
    pub fn with_address(mut self, address: SocketAddr) -> Self {
        self.address = address;
        self
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store = StoreConfig::File { path: path.into() };
        self
    }

    pub fn with_assets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.assets_path = Some(path.into());
        self
    }
}

/// Build the HTTP application for a core server
pub fn router(server: Server, assets_path: Option<PathBuf>) -> Router {
    let mut app = api::boot_router();
    if let Some(path) = assets_path {
        app = app.nest_service("/assets", ServeDir::new(path));
    }
    app.layer(TraceLayer::new_for_http())
        .with_state(AppState::new(server))
}

/// Open the store and serve until Ctrl+C
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let store = create_store(&config.store)
        .with_context(|| format!("failed to open store {:?}", config.store))?;

    if let Some(path) = &config.assets_path {
        anyhow::ensure!(path.is_dir(), "assets path {} is not a directory", path.display());
    }

    let app = router(Server::new(store), config.assets_path.clone());

    let listener = tokio::net::TcpListener::bind(config.address)
        .await
        .with_context(|| format!("failed to bind {}", config.address))?;
    info!(address = %config.address, store = ?config.store, "bootcfg listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
    }
}
