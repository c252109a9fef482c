//! HTTP server for cabled

use crate::config::{CabledConfig, ServerConfig};
use crate::controller::{ControllerPolicy, OrchestrationController};
use crate::engine::{HttpReasoningEngine, ReasoningEngine};
use crate::routes;
use crate::store::DesignStore;
use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use axum::Router;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    pub controller: Arc<OrchestrationController>,
    pub store: DesignStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(engine: Arc<dyn ReasoningEngine>, store: DesignStore, policy: ControllerPolicy) -> Self {
        let controller = OrchestrationController::new(engine, Arc::new(store.clone()), policy);
        Self {
            controller: Arc::new(controller),
            store,
            start_time: Instant::now(),
        }
    }

    /// Open the store, seed it if configured, and connect the HTTP engine.
    pub fn from_config(config: &CabledConfig) -> Result<Self> {
        let store = DesignStore::open(&config.storage.db_path)?;
        if config.storage.seed_on_start {
            store.seed_samples().context("Failed to seed sample designs")?;
        }

        let engine = HttpReasoningEngine::new(&config.engine)?;
        info!(
            "  Engine: {:?} {} at {}",
            config.engine.backend,
            config.engine.model,
            config.engine.endpoint()
        );

        Ok(Self::new(
            Arc::new(engine),
            store,
            ControllerPolicy::from_config(config),
        ))
    }
}

/// Build the router without binding, so tests can drive it in-process
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    Router::new()
        .merge(routes::design_routes())
        .merge(routes::health_routes())
        .with_state(Arc::new(state))
        .layer(cors_layer(&server.cors_origins))
        .layer(TraceLayer::new_for_http())
}

/// Browser access for the configured origins only
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) if origin != "*" => Some(value),
            _ => {
                warn!("  Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(600))
}

/// Run the HTTP server until Ctrl-C
pub async fn run(state: AppState, server: &ServerConfig) -> Result<()> {
    let bind_addr = server.bind_addr.as_str();
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    info!("  Listening on http://{}", bind_addr);

    axum::serve(listener, app(state, server))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("  Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("  Shutdown requested");
    }
}
