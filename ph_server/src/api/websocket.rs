//! WebSocket transport for the game protocol.
//!
//! Each text frame carries one JSON message. The handler owns no game state:
//! it forwards frames to the hub and writes whatever the hub queues on the
//! connection's outbound channel.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws`
//! 2. The connection is registered with the hub under a fresh id
//! 3. A send task drains the outbound channel into the socket
//! 4. Incoming frames pass the rate limiter and go to the hub
//! 5. On close, the hub is told the connection is gone
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:3001/ws');
//! ws.onopen = () => ws.send(JSON.stringify({ type: 'game:join', code: 'ABCD', playerName: 'Sam' }));
//! ws.onmessage = (event) => console.log(JSON.parse(event.data).type);
//! ```

use std::sync::atomic::Ordering;

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use party_host::{ErrorCode, GameError, ServerMessage, hub::Outbound};
use tokio::time::Instant;
use uuid::Uuid;

use super::{AppState, rate_limiter::{MessageLimiter, RateLimited}};
use crate::{logging, metrics};

/// Upgrade an HTTP connection to the game WebSocket.
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one established connection until either side closes it.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn = Uuid::new_v4();
    let conn_id = conn.to_string();
    let opened_at = Instant::now();

    let (mut sender, mut receiver) = socket.split();
    let (outbound, mut outbound_rx) = state.hub.outbound_channel();

    if let Err(e) = state.hub.connect(conn, outbound.clone()).await {
        tracing::error!(conn_id = %conn_id, error = %e, "Hub unavailable; dropping connection");
        return;
    }

    logging::log_connection_opened(&conn_id, None);
    metrics::websocket_connections_total();
    let active = state.active_connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_active(active);

    let send_task = tokio::spawn(async move {
        while let Some(text) = outbound_rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
            metrics::websocket_messages_sent();
        }
        let _ = sender.close().await;
    });

    let mut limiter = MessageLimiter::new(&state.rate_limits);
    let mut received: u64 = 0;

    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                received += 1;
                metrics::websocket_messages_received();

                if let Err(limited) = limiter.check() {
                    reject_rate_limited(&conn_id, &outbound, limited);
                    continue;
                }

                if state.hub.inbound(conn, text.as_str().to_owned()).await.is_err() {
                    tracing::error!(conn_id = %conn_id, "Hub closed; ending connection");
                    break;
                }
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
            // Pings are answered by axum; binary frames are not part of the protocol.
            _ => {}
        }
    }

    if state.hub.disconnect(conn).await.is_err() {
        tracing::warn!(conn_id = %conn_id, "Hub closed before disconnect was delivered");
    }
    drop(outbound);
    send_task.abort();

    let active = state
        .active_connections
        .fetch_sub(1, Ordering::Relaxed)
        .saturating_sub(1);
    metrics::websocket_connections_active(active);
    logging::log_connection_closed(
        &conn_id,
        received,
        u64::try_from(opened_at.elapsed().as_millis()).unwrap_or(u64::MAX),
    );
}

/// Tell the client its frame was dropped. The frame never reaches the hub.
fn reject_rate_limited(conn_id: &str, outbound: &Outbound, limited: RateLimited) {
    logging::log_rate_limited(conn_id, limited.retry_after.as_secs().max(1));
    metrics::rate_limit_hits_total(limited.window.as_str());

    let error = GameError::RateLimited;
    match ServerMessage::error(ErrorCode::RateLimited, error.client_message()).to_json() {
        Ok(json) => {
            if outbound.try_send(json).is_err() {
                tracing::debug!(conn_id = %conn_id, "Outbound full; rate-limit notice dropped");
            }
        }
        Err(e) => tracing::error!(conn_id = %conn_id, error = %e, "Failed to encode error"),
    }
}
