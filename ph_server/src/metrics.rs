//! Prometheus metrics for monitoring the game server.
//!
//! Metrics are recorded through the `metrics` facade and only exported when a
//! Prometheus listener has been installed with [`init_metrics`]. Without one
//! the recording calls are no-ops.
//!
//! # Metrics Categories
//!
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Game Metrics**: Active games
//! - **Rate Limiting Metrics**: Rejected messages
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use ph_server::metrics;
//! use std::net::SocketAddr;
//!
//! // Initialize metrics exporter
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! // Record WebSocket connection
//! metrics::websocket_connections_active(10);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Sets up a Prometheus scrape endpoint on the specified address.
/// Metrics will be available at `http://<addr>/metrics`.
///
/// # Arguments
///
/// - `addr`: Address to bind the metrics server to (e.g., `0.0.0.0:9090`)
///
/// # Returns
///
/// Result indicating success or error message
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Set current active WebSocket connections count.
pub fn websocket_connections_active(count: u64) {
    metrics::gauge!("websocket_connections_active").set(count as f64);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Set current active games count.
pub fn active_games(count: usize) {
    metrics::gauge!("active_games").set(count as f64);
}

// ============================================================================
// Rate Limiting Metrics
// ============================================================================

/// Increment rate limit hits counter.
pub fn rate_limit_hits_total(window: &'static str) {
    metrics::counter!("rate_limit_hits_total", "window" => window).increment(1);
}
