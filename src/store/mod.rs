//! Storage seams for the ticketing backend.
//!
//! Each entity gets its own repository trait so the issuance core and the
//! HTTP handlers depend on interfaces, not on a concrete backend. The
//! bundled implementation is in-memory ([`memory`]); a transactional store
//! can implement the same traits without touching callers.

pub mod memory;

use crate::error::AppError;
use crate::types::{
    ApiKey, ApiKeyId, ApiKeyStatus, Artist, ArtistId, Event, EventId, EventStatus, Ticket,
    TicketId, TicketStatus, User, UserId,
};
use async_trait::async_trait;
use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A lock guarding the backing map was poisoned.
    #[error("store lock poisoned")]
    LockPoisoned,

    /// The referenced entity does not exist.
    #[error("{entity} not found")]
    NotFound {
        /// Entity kind, for the error message.
        entity: &'static str,
    },

    /// A uniqueness constraint was violated.
    #[error("{0}")]
    Conflict(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::LockPoisoned => {
                Self::internal("Storage unavailable").with_source(anyhow::anyhow!(err))
            }
            StoreError::NotFound { entity } => Self::new(
                axum::http::StatusCode::NOT_FOUND,
                format!("{entity} not found"),
                "NOT_FOUND".to_string(),
            ),
            StoreError::Conflict(message) => Self::conflict(message),
        }
    }
}

/// Repository for [`Artist`] entities.
#[async_trait]
pub trait ArtistStore: Send + Sync {
    /// Persist a new artist.
    async fn insert(&self, artist: Artist) -> Result<Artist>;
    /// Look up an artist by id.
    async fn find_by_id(&self, id: ArtistId) -> Result<Option<Artist>>;
    /// All artists, unordered.
    async fn list(&self) -> Result<Vec<Artist>>;
    /// Replace an existing artist.
    async fn update(&self, artist: Artist) -> Result<Artist>;
    /// Delete an artist; returns whether it existed.
    async fn delete(&self, id: ArtistId) -> Result<bool>;
}

/// Repository for [`Event`] entities.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a new event.
    async fn insert(&self, event: Event) -> Result<Event>;
    /// Look up an event by id.
    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>>;
    /// All events, unordered.
    async fn list(&self) -> Result<Vec<Event>>;
    /// Replace an existing event.
    async fn update(&self, event: Event) -> Result<Event>;
    /// Transition an event's lifecycle status.
    async fn update_status(&self, id: EventId, status: EventStatus) -> Result<()>;
    /// Delete an event; returns whether it existed.
    async fn delete(&self, id: EventId) -> Result<bool>;
}

/// Repository for [`User`] entities.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new user. Fails with [`StoreError::Conflict`] when the
    /// email is already registered.
    async fn insert(&self, user: User) -> Result<User>;
    /// Look up a user by id.
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>>;
    /// Look up a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// All users, unordered.
    async fn list(&self) -> Result<Vec<User>>;
    /// Replace an existing user.
    async fn update(&self, user: User) -> Result<User>;
    /// Delete a user; returns whether it existed.
    async fn delete(&self, id: UserId) -> Result<bool>;
}

/// Repository for [`ApiKey`] entities.
#[async_trait]
pub trait ApiKeyStore: Send + Sync {
    /// Persist a new key.
    async fn insert(&self, key: ApiKey) -> Result<ApiKey>;
    /// Look up a key record by id.
    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>>;
    /// Look up an `Active` key by its opaque key material.
    async fn find_active_by_key(&self, key: &str) -> Result<Option<ApiKey>>;
    /// All `Active` keys belonging to a user.
    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<ApiKey>>;
    /// Transition a key's lifecycle status.
    async fn update_status(&self, id: ApiKeyId, status: ApiKeyStatus) -> Result<()>;
}

/// Repository for [`Ticket`] entities.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a new ticket.
    async fn insert(&self, ticket: Ticket) -> Result<Ticket>;
    /// Look up a ticket by id.
    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>>;
    /// All tickets, unordered.
    async fn list(&self) -> Result<Vec<Ticket>>;
    /// Sum of quantities across an event's tickets, excluding the given
    /// status. Passing [`TicketStatus::Cancelled`] yields the sold count.
    async fn count_for_event_excluding(
        &self,
        event_id: EventId,
        excluded: TicketStatus,
    ) -> Result<u32>;
    /// Transition a ticket's lifecycle status.
    async fn update_status(&self, id: TicketId, status: TicketStatus) -> Result<()>;
    /// Delete a ticket; returns whether it existed.
    async fn delete(&self, id: TicketId) -> Result<bool>;
}
