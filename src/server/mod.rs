// HTTP service
// axum router exposing the detection engine behind an API key

pub mod detection;
pub mod error;
pub mod health;

pub use error::{ApiError, ApiResult};

use anyhow::Context;
use axum::{extract::DefaultBodyLimit, routing::get, Router};
use chrono::{DateTime, Utc};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::scoring::DetectionEngine;

/// Development key used when none is configured
pub const DEFAULT_API_KEY: &str = "sk_test_123456789";

/// Request body cap in megabytes; base64 adds a third on top of the audio
pub const DEFAULT_MAX_BODY_MB: usize = 50;

/// Listener and authentication settings for the HTTP service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    pub api_key: String,

    /// Largest accepted request body, in megabytes
    pub max_body_mb: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        ServiceSettings {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_key: DEFAULT_API_KEY.to_string(),
            max_body_mb: DEFAULT_MAX_BODY_MB,
        }
    }
}

impl ServiceSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.max_body_mb.saturating_mul(1024 * 1024)
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DetectionEngine>,
    pub api_key: Arc<str>,

    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,

    /// Request body limit applied by the router
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(engine: DetectionEngine, api_key: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            api_key: Arc::from(api_key.into()),
            startup_time: Utc::now(),
            max_body_bytes: DEFAULT_MAX_BODY_MB * 1024 * 1024,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.max_body_bytes);

    Router::new()
        .route(
            "/api/voice-detection",
            get(detection::usage_info).post(detection::detect_voice),
        )
        .merge(health::health_routes())
        .layer(body_limit)
        .with_state(state)
}

/// Serve until Ctrl-C
pub async fn serve(settings: ServiceSettings, engine: DetectionEngine) -> anyhow::Result<()> {
    if settings.api_key == DEFAULT_API_KEY {
        log::warn!("Using the development API key; set API_KEY for real deployments");
    }

    let state = AppState::new(engine, settings.api_key.clone())
        .with_max_body_bytes(settings.max_body_bytes());
    let app = build_router(state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    let local: SocketAddr = listener.local_addr()?;

    log::info!("Listening on http://{}", local);
    log::info!("Health check: http://{}/health", local);
    log::info!("Request body limit: {} MB", settings.max_body_mb);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
