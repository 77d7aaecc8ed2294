//! Router configuration for the ticketing backend.
//!
//! Builds the complete Axum router with all endpoints and the middleware
//! stack. Request order through the stack: rate limiter first (throttled
//! requests fail fast without touching anything else), then API key
//! authentication, then the handler.

use super::health::{health_check, readiness_check};
use super::state::AppState;
use crate::api::{apikeys, artists, auth, events, tickets, users};
use crate::auth::middleware::require_api_key;
use crate::throttle::rate_limit_layer;
use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the complete Axum router.
///
/// Configures all routes:
/// - Health checks
/// - Artist, event, user, and API key management
/// - Authentication
/// - Ticket purchase and management
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Artist management
        .route("/artists", post(artists::create_artist))
        .route("/artists", get(artists::list_artists))
        .route("/artists/search", get(artists::search_artists))
        .route("/artists/:id", get(artists::get_artist))
        .route("/artists/:id", put(artists::update_artist))
        .route("/artists/:id", delete(artists::delete_artist))
        // Event management
        .route("/events", post(events::create_event))
        .route("/events", get(events::list_events))
        .route("/events/search", get(events::search_events))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id", put(events::update_event))
        .route("/events/:id", delete(events::delete_event))
        // Users
        .route("/users", post(users::create_user))
        .route("/users", get(users::list_users))
        .route("/users/:id", get(users::get_user))
        .route("/users/:id", put(users::update_user))
        .route("/users/:id", delete(users::delete_user))
        // API keys
        .route("/apikeys/generate/:user_id", post(apikeys::generate_key))
        .route("/apikeys/user/:user_id", get(apikeys::list_keys_for_user))
        .route("/apikeys/:id", delete(apikeys::revoke_key))
        // Authentication
        .route("/auth/login", post(auth::login))
        // Tickets (purchase is the idempotent, capacity-bounded core)
        .route("/tickets", post(tickets::purchase_ticket))
        .route("/tickets", get(tickets::list_tickets))
        .route("/tickets/search", get(tickets::search_tickets))
        .route("/tickets/:id", get(tickets::get_ticket))
        .route("/tickets/:id/status", put(tickets::update_ticket_status))
        .route("/tickets/:id", delete(tickets::delete_ticket));

    Router::new()
        // Health checks (no authentication)
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        // API routes under /api/v1 prefix
        .nest("/api/v1", api_routes)
        // Innermost first: auth runs after the rate limiter admits.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ))
        .layer(rate_limit_layer(Arc::clone(&state.limiter)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
