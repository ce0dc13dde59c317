//! Web server for the exploration dashboard
//!
//! Provides an HTTP server using Axum to serve the dashboard UI
//! and JSON API endpoints.

use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::config::CompiledConfig;
use crate::dataset::Dataset;

use super::routes;

/// Largest accepted CSV upload
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Shared application state
pub struct AppState {
    /// Most recently loaded dataset (single session)
    pub dataset: RwLock<Option<Arc<Dataset>>>,
    pub config: CompiledConfig,
    pub api_endpoint: Option<String>,
}

impl AppState {
    pub fn new(dataset: Option<Dataset>, config: CompiledConfig, api_endpoint: Option<String>) -> Self {
        Self {
            dataset: RwLock::new(dataset.map(Arc::new)),
            config,
            api_endpoint,
        }
    }

    /// Current dataset, if one has been loaded
    pub fn current(&self) -> Option<Arc<Dataset>> {
        self.dataset
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the current dataset
    pub fn replace(&self, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        *self
            .dataset
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Arc::clone(&dataset));
        dataset
    }
}

/// Configuration for the web server
pub struct ServerConfig {
    pub port: u16,
    pub open_browser: bool,
    pub api_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            open_browser: true,
            api_endpoint: None,
        }
    }
}

/// Assemble API and static routes around the shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    // A separately deployed frontend calls the API cross-origin
    let cross_origin = state.api_endpoint.is_some();

    let app = Router::new()
        .merge(routes::api_routes())
        .merge(routes::static_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state);

    if cross_origin {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Start the web server and serve the dashboard
pub async fn start_server(
    dataset: Option<Dataset>,
    config: CompiledConfig,
    server_config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state = Arc::new(AppState::new(
        dataset,
        config,
        server_config.api_endpoint.clone(),
    ));
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], server_config.port));
    let listener = TcpListener::bind(addr).await?;

    let url = format!("http://localhost:{}", server_config.port);
    info!(%url, "starting web server");
    eprintln!("Starting web server at {}", url);

    if server_config.open_browser {
        eprintln!("Opening browser...");
        if let Err(e) = open::that(&url) {
            warn!(error = %e, "could not open browser");
            eprintln!("Please open {} manually", url);
        }
    }

    eprintln!("Press Ctrl+C to stop the server");

    axum::serve(listener, app).await?;

    Ok(())
}
