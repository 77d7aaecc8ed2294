//! Shared helpers for the integration tests.

#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use axum_test::TestServer;
use festival_tickets::config::{AuthConfig, Config, IdempotencyConfig, RateLimitConfig, ServerConfig};
use festival_tickets::{AppState, build_router};
use http::{HeaderName, HeaderValue};
use serde_json::{Value, json};
use std::collections::HashMap;

/// A permissive configuration so functional tests never trip the limiter.
pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        rate_limit: RateLimitConfig {
            window_secs: 60,
            default_limit: 100_000,
            endpoint_limits: HashMap::new(),
        },
        idempotency: IdempotencyConfig {
            retention_secs: 86_400,
        },
        auth: AuthConfig {
            api_key_ttl_days: 30,
        },
    }
}

/// Spin up a test server over fresh in-memory state.
pub fn server_with(config: Config) -> TestServer {
    TestServer::new(build_router(AppState::in_memory(config))).unwrap()
}

/// Spin up a test server with the permissive configuration.
pub fn server() -> TestServer {
    server_with(test_config())
}

pub fn api_key_header() -> HeaderName {
    HeaderName::from_static("x-api-key")
}

pub fn idempotency_header() -> HeaderName {
    HeaderName::from_static("idempotency-key")
}

pub fn header_value(value: &str) -> HeaderValue {
    HeaderValue::from_str(value).unwrap()
}

/// Register a user and generate an API key for it.
pub async fn bootstrap_api_key(server: &TestServer) -> String {
    let user = server
        .post("/api/v1/users")
        .json(&json!({
            "name": "Test Operator",
            "email": format!("operator+{}@example.com", uuid::Uuid::new_v4()),
            "password": "operator-password",
        }))
        .await;
    assert_eq!(user.status_code(), 201, "{}", user.text());
    let user_id = user.json::<Value>()["id"].as_str().unwrap().to_string();

    let key = server
        .post(&format!("/api/v1/apikeys/generate/{user_id}"))
        .await;
    assert_eq!(key.status_code(), 201, "{}", key.text());
    key.json::<Value>()["key"].as_str().unwrap().to_string()
}

/// Create an event and return its id.
pub async fn create_event(
    server: &TestServer,
    api_key: &str,
    capacity: u32,
    price_cents: u64,
) -> String {
    let response = server
        .post("/api/v1/events")
        .add_header(api_key_header(), header_value(api_key))
        .json(&json!({
            "name": "Harbor Lights Festival",
            "date": "2026-09-12T18:00:00Z",
            "venue": "Harbor Stage",
            "capacity_maximum": capacity,
            "ticket_price_cents": price_cents,
        }))
        .await;
    assert_eq!(response.status_code(), 201, "{}", response.text());
    response.json::<Value>()["id"].as_str().unwrap().to_string()
}

/// A well-formed purchase body for the given event.
pub fn purchase_body(event_id: &str, quantity: u32) -> Value {
    json!({
        "event_id": event_id,
        "buyer_name": "Ana Souza",
        "buyer_email": "ana@example.com",
        "quantity": quantity,
    })
}
