//! Integration tests for the HTTP surface.
//!
//! Tests the health check, unknown routes and CORS handling.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use party_host::{HubActor, HubConfig, games::default_registry};
use ph_server::{
    api::{AppState, create_router},
    config::RateLimitConfig,
};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt; // For `oneshot` method

/// Helper to create a router backed by a running hub
fn create_test_server() -> axum::Router {
    let hub = HubActor::spawn(default_registry(), HubConfig::default());
    create_router(AppState::new(hub, RateLimitConfig::default()))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert_eq!(body["games"], 0);
    assert_eq!(body["connections"], 0);
    assert_eq!(body["plugins"], serde_json::json!(["trivia"]));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_health_check_reports_stopped_hub() {
    let (actor, hub) = HubActor::new(default_registry(), HubConfig::default());
    drop(actor);
    let app = create_router(AppState::new(hub, RateLimitConfig::default()));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(response).await["status"], "unhealthy");
}

#[tokio::test]
async fn test_health_check_responds_promptly() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let result = timeout(Duration::from_secs(5), app.oneshot(request)).await;
    assert!(result.is_ok(), "Health check should not hang");
}

#[tokio::test]
async fn test_unknown_route_returns_404() {
    let app = create_test_server();

    let request = Request::builder()
        .uri("/api/tables")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_websocket_route_requires_upgrade() {
    let app = create_test_server();

    let request = Request::builder().uri("/ws").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = create_test_server();

    let request = Request::builder()
        .method("OPTIONS")
        .uri("/health")
        .header("Origin", "http://display.local")
        .header("Access-Control-Request-Method", "GET")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}
