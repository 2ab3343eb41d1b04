//! Party game host server.
//!
//! HTTP and WebSocket surface around the [`party_host`] game hub, plus the
//! server's configuration, logging and metrics.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
