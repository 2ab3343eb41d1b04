//! Structured logging configuration.
//!
//! The library crate logs through the `log` facade; the subscriber installed
//! here also captures those records, so both end up in one stream.

use std::net::SocketAddr;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var and default to
/// `info`.
///
/// # Example
///
/// ```no_run
/// use ph_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    // `try_init` so tests and embedders that already installed a subscriber
    // keep theirs.
    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_ok()
    {
        tracing::info!("Structured logging initialized");
    }
}

/// Log a WebSocket connection being accepted
///
/// # Arguments
///
/// * `conn_id` - Connection identifier
/// * `peer` - Remote address, when known
pub fn log_connection_opened(conn_id: &str, peer: Option<SocketAddr>) {
    tracing::info!(
        conn_id = conn_id,
        peer = peer.map(|p| p.to_string()),
        "WebSocket connection opened"
    );
}

/// Log a WebSocket connection closing
///
/// # Arguments
///
/// * `conn_id` - Connection identifier
/// * `messages_received` - Text frames received over the connection's life
/// * `duration_ms` - How long the connection was open
pub fn log_connection_closed(conn_id: &str, messages_received: u64, duration_ms: u64) {
    tracing::info!(
        conn_id = conn_id,
        messages_received = messages_received,
        duration_ms = duration_ms,
        "WebSocket connection closed"
    );
}

/// Log a connection exceeding its message rate
pub fn log_rate_limited(conn_id: &str, retry_after_secs: u64) {
    tracing::warn!(
        conn_id = conn_id,
        retry_after_secs = retry_after_secs,
        "Rate limit exceeded"
    );
}
