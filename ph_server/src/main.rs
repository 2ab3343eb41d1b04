//! Party game host server.
//!
//! Spawns the game hub actor and serves the WebSocket protocol and health
//! check over axum.

use std::net::SocketAddr;

use anyhow::{Context, Error};
use log::info;
use party_host::{HubActor, games::default_registry};
use pico_args::Arguments;

use ph_server::{
    api::{self, AppState},
    config::ServerConfig,
    logging, metrics,
};

const HELP: &str = "\
Run a party game host server

USAGE:
  ph_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:3001]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:3001)
  METRICS_BIND             Prometheus exporter address (disabled when unset)
  RECONNECT_GRACE_SECS     Seconds a disconnected player keeps their seat
  REAPER_INTERVAL_SECS     Seconds between stale-game sweeps
  GAME_MAX_IDLE_SECS       Idle seconds before an ended or empty game is removed
  SESSION_MAX_AGE_SECS     Seconds before a reconnection token expires
  OUTBOUND_BUFFER          Frames buffered per connection
  WS_BURST_LIMIT           Messages per second per connection
  WS_SUSTAINED_LIMIT       Messages per minute per connection
  RUST_LOG                 Log filter (default: info)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs
        .opt_value_from_str("--bind")
        .context("Invalid --bind address")?;

    logging::init();

    let config = ServerConfig::from_env(bind)?;
    config.validate()?;

    if let Some(addr) = config.metrics_bind {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics exported on http://{addr}/metrics");
    }

    let plugins = default_registry();
    info!(
        "Registered game types: {}",
        plugins
            .available()
            .iter()
            .map(|p| p.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let hub = HubActor::spawn(plugins, config.to_hub_config());
    let app = api::create_router(AppState::new(hub, config.rate_limits.clone()));

    info!("Starting HTTP/WebSocket server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install CTRL+C signal handler: {e}");
        std::future::pending::<()>().await;
    }
}
