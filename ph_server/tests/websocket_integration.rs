//! WebSocket integration tests for the game protocol.
//!
//! Runs a real server on an ephemeral port and drives it with
//! `tokio-tungstenite` clients.

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use party_host::{HubActor, HubConfig, games::default_registry};
use ph_server::{
    api::{AppState, create_router},
    config::RateLimitConfig,
};
use serde_json::{Value, json};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper to start a server and return its address
async fn start_server(rate_limits: RateLimitConfig) -> SocketAddr {
    let hub = HubActor::spawn(default_registry(), HubConfig::default());
    let app = create_router(AppState::new(hub, rate_limits));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Socket {
    let (socket, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    socket
}

async fn send(socket: &mut Socket, message: Value) {
    socket
        .send(Message::text(message.to_string()))
        .await
        .unwrap();
}

/// Next JSON text frame, skipping control frames
async fn recv(socket: &mut Socket) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one of type `kind` arrives
async fn recv_type(socket: &mut Socket, kind: &str) -> Value {
    loop {
        let frame = recv(socket).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_ping_pong() {
    let addr = start_server(RateLimitConfig::default()).await;
    let mut socket = connect(addr).await;

    send(&mut socket, json!({"type": "ping"})).await;
    assert_eq!(recv(&mut socket).await["type"], "pong");
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection_open() {
    let addr = start_server(RateLimitConfig::default()).await;
    let mut socket = connect(addr).await;

    socket.send(Message::text("{oops")).await.unwrap();
    let error = recv(&mut socket).await;
    assert_eq!(error["type"], "error");
    assert_eq!(error["code"], "INVALID_MESSAGE");

    send(&mut socket, json!({"type": "ping"})).await;
    assert_eq!(recv(&mut socket).await["type"], "pong");
}

#[tokio::test]
async fn test_display_and_players_over_websocket() {
    let addr = start_server(RateLimitConfig::default()).await;
    let mut display = connect(addr).await;

    send(&mut display, json!({"type": "game:create", "gameType": "trivia"})).await;
    let created = recv_type(&mut display, "game:created").await;
    let code = created["code"].as_str().unwrap().to_string();
    recv_type(&mut display, "display:joined").await;

    let mut alice = connect(addr).await;
    send(
        &mut alice,
        json!({"type": "game:join", "code": code, "playerName": "Alice"}),
    )
    .await;
    let joined = recv_type(&mut alice, "game:joined").await;
    assert!(joined["sessionToken"].is_string());

    let mut bob = connect(addr).await;
    send(
        &mut bob,
        json!({"type": "game:join", "code": code, "playerName": "Bob"}),
    )
    .await;
    recv_type(&mut bob, "game:joined").await;

    let update = recv_type(&mut display, "players:update").await;
    assert_eq!(update["players"].as_array().unwrap().len(), 1);
    let update = recv_type(&mut display, "players:update").await;
    assert_eq!(update["players"].as_array().unwrap().len(), 2);

    send(&mut alice, json!({"type": "host:start"})).await;
    let round = recv_type(&mut display, "round:start").await;
    assert_eq!(round["round"]["roundNumber"], 1);
    let state = recv(&mut display).await;
    assert_eq!(state["type"], "state:update");
    assert_eq!(state["isDisplay"], true);
    assert!(!state.to_string().contains("correctIndex"));
}

#[tokio::test]
async fn test_reconnect_after_socket_drop() {
    let addr = start_server(RateLimitConfig::default()).await;
    let mut alice = connect(addr).await;

    send(
        &mut alice,
        json!({"type": "game:create", "gameType": "trivia", "playerName": "Alice"}),
    )
    .await;
    let code = recv_type(&mut alice, "game:created").await["code"]
        .as_str()
        .unwrap()
        .to_string();
    let joined = recv_type(&mut alice, "game:joined").await;
    let token = joined["sessionToken"].as_str().unwrap().to_string();
    let player_id = joined["playerId"].clone();

    alice.close(None).await.unwrap();
    drop(alice);

    let mut again = connect(addr).await;
    send(
        &mut again,
        json!({"type": "session:reconnect", "sessionToken": token, "code": code}),
    )
    .await;
    let rejoined = recv_type(&mut again, "game:joined").await;
    assert_eq!(rejoined["playerId"], player_id);
}

#[tokio::test]
async fn test_rate_limited_frames_are_rejected() {
    let addr = start_server(RateLimitConfig {
        burst_limit: 3,
        sustained_limit: 100,
    })
    .await;
    let mut socket = connect(addr).await;

    for _ in 0..5 {
        send(&mut socket, json!({"type": "ping"})).await;
    }

    let mut pongs = 0;
    let mut limited = 0;
    for _ in 0..5 {
        let frame = recv(&mut socket).await;
        match frame["type"].as_str().unwrap() {
            "pong" => pongs += 1,
            "error" => {
                assert_eq!(frame["code"], "RATE_LIMITED");
                limited += 1;
            }
            other => panic!("unexpected frame {other}"),
        }
    }
    assert_eq!(pongs, 3);
    assert_eq!(limited, 2);
}
