//! Application state for the HTTP server.
//!
//! Contains all shared resources needed by handlers: the repositories, the
//! ticket issuer, the idempotency coordinator, and the rate limiter. All
//! formerly-global registries of the naive design live here as explicitly
//! constructed, injected services with process-scoped lifetime.

use crate::config::Config;
use crate::idempotency::IdempotencyCoordinator;
use crate::issuer::TicketIssuer;
use crate::store::memory::{
    InMemoryApiKeyStore, InMemoryArtistStore, InMemoryEventStore, InMemoryTicketStore,
    InMemoryUserStore,
};
use crate::store::{ApiKeyStore, ArtistStore, EventStore, TicketStore, UserStore};
use crate::throttle::RateLimiter;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers.
///
/// Cloned (cheaply, via `Arc`) for each request.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Artist repository.
    pub artists: Arc<dyn ArtistStore>,
    /// Event repository.
    pub events: Arc<dyn EventStore>,
    /// User repository.
    pub users: Arc<dyn UserStore>,
    /// API key repository.
    pub api_keys: Arc<dyn ApiKeyStore>,
    /// Ticket repository.
    pub tickets: Arc<dyn TicketStore>,
    /// The only writer of event inventory.
    pub issuer: Arc<TicketIssuer>,
    /// At-most-once purchase execution per idempotency key.
    pub idempotency: Arc<IdempotencyCoordinator>,
    /// Per-client, per-endpoint request throttling.
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Build a fully wired state over in-memory stores.
    #[must_use]
    pub fn in_memory(config: Config) -> Self {
        let config = Arc::new(config);
        let artists: Arc<dyn ArtistStore> = Arc::new(InMemoryArtistStore::new());
        let events: Arc<dyn EventStore> = Arc::new(InMemoryEventStore::new());
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::new());
        let api_keys: Arc<dyn ApiKeyStore> = Arc::new(InMemoryApiKeyStore::new());
        let tickets: Arc<dyn TicketStore> = Arc::new(InMemoryTicketStore::new());

        let issuer = Arc::new(TicketIssuer::new(Arc::clone(&events), Arc::clone(&tickets)));
        let idempotency = Arc::new(IdempotencyCoordinator::new(Duration::from_secs(
            config.idempotency.retention_secs,
        )));
        let limiter = Arc::new(RateLimiter::new(config.rate_limit.clone()));

        Self {
            config,
            artists,
            events,
            users,
            api_keys,
            tickets,
            issuer,
            idempotency,
            limiter,
        }
    }
}
