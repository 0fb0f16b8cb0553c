//! Docweave Service
//!
//! HTTP front end for the extractor. Exposes `POST /extract-data`,
//! `GET /profiles` and `GET /health`; every request runs in a span carrying
//! a UUIDv7 request id.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ProviderKind, ServiceConfig};
use docweave_catalog::{FsCatalog, LayeredResolver};
use docweave_extractor::Extractor;
use docweave_llm::StubProvider;
use handlers::{create_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Service error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Build the shared state: provider, extractor and profile resolver
pub fn build_state(config: &ServiceConfig) -> AppState {
    let extractor = match config.provider {
        ProviderKind::Ollama => Extractor::with_default_provider(config.extractor.clone()),
        ProviderKind::Stub => Extractor::new(Arc::new(StubProvider::new()), config.extractor.clone()),
    };
    let resolver = match config.catalog_config() {
        Some(catalog) => LayeredResolver::new(FsCatalog::new(catalog)),
        None => LayeredResolver::builtin_only(),
    };

    AppState {
        extractor: Arc::new(extractor),
        resolver: Arc::new(resolver),
    }
}

/// Start the HTTP server
///
/// Builds the application state and serves until the listener fails.
pub async fn start_server(config: ServiceConfig) -> Result<(), ServiceError> {
    info!("Starting Docweave service");
    info!("Bind address: {}", config.bind_addr());
    info!("Provider: {}", config.provider);
    info!("Default model: {}", config.extractor.default_model);

    let state = build_state(&config);
    if let Some(store) = state.resolver.store() {
        info!("Profile store: {}", store.config().root_dir.display());
    }

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Service listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .await
        .map_err(|e| ServiceError::Server(e.to_string()))?;

    Ok(())
}
