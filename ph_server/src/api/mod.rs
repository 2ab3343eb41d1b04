//! HTTP/WebSocket API for the party game server.
//!
//! # Architecture
//!
//! The API is built with:
//! - **Axum**: Async web framework for HTTP/WebSocket
//! - **Tower**: CORS middleware
//! - **Actor Model**: All game state lives on one hub task; connections talk
//!   to it through a [`HubHandle`]
//!
//! # Modules
//!
//! - [`websocket`]: The game protocol transport
//! - [`rate_limiter`]: Per-connection flood protection
//!
//! # Endpoints Overview
//!
//! - `GET /health` - Server health status
//! - `GET /ws` - Establish a WebSocket connection
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ph_server::{api::{create_router, AppState}, config::ServerConfig};
//! use party_host::{HubActor, games::default_registry};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let hub = HubActor::spawn(default_registry(), config.to_hub_config());
//! let app = create_router(AppState::new(hub, config.rate_limits));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3001").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively so displays and phones can be served from
//! any origin.

pub mod rate_limiter;
pub mod websocket;

use std::sync::{Arc, atomic::AtomicU64};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use party_host::HubHandle;
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{config::RateLimitConfig, metrics};

/// Application state shared across all HTTP handlers and WebSocket connections.
///
/// Cloned per request; every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub rate_limits: RateLimitConfig,
    /// Open WebSocket connections, mirrored into the active-connections gauge
    pub active_connections: Arc<AtomicU64>,
}

impl AppState {
    pub fn new(hub: HubHandle, rate_limits: RateLimitConfig) -> Self {
        Self {
            hub,
            rate_limits,
            active_connections: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Create the API router.
///
/// # Endpoint Summary
///
/// ```text
/// GET  /health    - Health check
/// GET  /ws        - WebSocket game protocol
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(websocket::websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Asks the hub for its stats, which also proves the hub task is alive.
///
/// # Response
///
/// Returns `200 OK` when the hub answers, or `503 Service Unavailable` when it
/// has stopped.
///
/// # Example
///
/// ```bash
/// curl http://localhost:3001/health
/// # {"status":"healthy","version":"0.1.0","games":2,"connections":7,"plugins":["trivia"],"timestamp":"..."}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.hub.stats().await {
        Ok(stats) => {
            metrics::active_games(stats.games);
            let response = json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "games": stats.games,
                "connections": stats.connections,
                "plugins": stats.plugins,
                "timestamp": timestamp,
            });
            (StatusCode::OK, Json(response))
        }
        Err(e) => {
            tracing::error!(error = %e, "Health check failed");
            let response = json!({
                "status": "unhealthy",
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": timestamp,
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(response))
        }
    }
}
