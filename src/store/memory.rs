//! In-memory repository implementations.
//!
//! Backing storage is a locked `HashMap` per entity. These are the
//! process-local authority for all state; callers needing atomicity across
//! a read-check-write sequence (the ticket issuer) layer their own per-key
//! locking on top.

use super::{
    ApiKeyStore, ArtistStore, EventStore, Result, StoreError, TicketStore, UserStore,
};
use crate::types::{
    ApiKey, ApiKeyId, ApiKeyStatus, Artist, ArtistId, Event, EventId, EventStatus, Ticket,
    TicketId, TicketStatus, User, UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// In-memory artist repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryArtistStore {
    inner: Arc<RwLock<HashMap<ArtistId, Artist>>>,
}

impl InMemoryArtistStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtistStore for InMemoryArtistStore {
    async fn insert(&self, artist: Artist) -> Result<Artist> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        guard.insert(artist.id, artist.clone());
        Ok(artist)
    }

    async fn find_by_id(&self, id: ArtistId) -> Result<Option<Artist>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Artist>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn update(&self, artist: Artist) -> Result<Artist> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if !guard.contains_key(&artist.id) {
            return Err(StoreError::NotFound { entity: "Artist" });
        }
        guard.insert(artist.id, artist.clone());
        Ok(artist)
    }

    async fn delete(&self, id: ArtistId) -> Result<bool> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.remove(&id).is_some())
    }
}

/// In-memory event repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    inner: Arc<RwLock<HashMap<EventId, Event>>>,
}

impl InMemoryEventStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: Event) -> Result<Event> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        guard.insert(event.id, event.clone());
        Ok(event)
    }

    async fn find_by_id(&self, id: EventId) -> Result<Option<Event>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Event>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn update(&self, event: Event) -> Result<Event> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if !guard.contains_key(&event.id) {
            return Err(StoreError::NotFound { entity: "Event" });
        }
        guard.insert(event.id, event.clone());
        Ok(event)
    }

    async fn update_status(&self, id: EventId, status: EventStatus) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let event = guard
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Event" })?;
        event.status = status;
        Ok(())
    }

    async fn delete(&self, id: EventId) -> Result<bool> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.remove(&id).is_some())
    }
}

/// In-memory user repository with an email uniqueness check.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<User> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if guard.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(
                "email is already registered".to_string(),
            ));
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().find(|u| u.email == email).cloned())
    }

    async fn list(&self) -> Result<Vec<User>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn update(&self, user: User) -> Result<User> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        if !guard.contains_key(&user.id) {
            return Err(StoreError::NotFound { entity: "User" });
        }
        // Email uniqueness must hold across the other users.
        if guard
            .values()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(StoreError::Conflict(
                "email is already registered".to_string(),
            ));
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.remove(&id).is_some())
    }
}

/// In-memory API key repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryApiKeyStore {
    inner: Arc<RwLock<HashMap<ApiKeyId, ApiKey>>>,
}

impl InMemoryApiKeyStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyStore for InMemoryApiKeyStore {
    async fn insert(&self, key: ApiKey) -> Result<ApiKey> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        guard.insert(key.id, key.clone());
        Ok(key)
    }

    async fn find_by_id(&self, id: ApiKeyId) -> Result<Option<ApiKey>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn find_active_by_key(&self, key: &str) -> Result<Option<ApiKey>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard
            .values()
            .find(|k| k.key == key && k.status == ApiKeyStatus::Active)
            .cloned())
    }

    async fn list_active_for_user(&self, user_id: UserId) -> Result<Vec<ApiKey>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard
            .values()
            .filter(|k| k.user_id == user_id && k.status == ApiKeyStatus::Active)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: ApiKeyId, status: ApiKeyStatus) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let key = guard
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "ApiKey" })?;
        key.status = status;
        Ok(())
    }
}

/// In-memory ticket repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTicketStore {
    inner: Arc<RwLock<HashMap<TicketId, Ticket>>>,
}

impl InMemoryTicketStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn insert(&self, ticket: Ticket) -> Result<Ticket> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        guard.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find_by_id(&self, id: TicketId) -> Result<Option<Ticket>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list(&self) -> Result<Vec<Ticket>> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.values().cloned().collect())
    }

    async fn count_for_event_excluding(
        &self,
        event_id: EventId,
        excluded: TicketStatus,
    ) -> Result<u32> {
        let guard = self.inner.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard
            .values()
            .filter(|t| t.event_id == event_id && t.status != excluded)
            .map(|t| t.quantity)
            .sum())
    }

    async fn update_status(&self, id: TicketId, status: TicketStatus) -> Result<()> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        let ticket = guard
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Ticket" })?;
        ticket.status = status;
        Ok(())
    }

    async fn delete(&self, id: TicketId) -> Result<bool> {
        let mut guard = self.inner.write().map_err(|_| StoreError::LockPoisoned)?;
        Ok(guard.remove(&id).is_some())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::types::Money;
    use chrono::Utc;

    fn sample_event() -> Event {
        Event {
            id: EventId::new(),
            name: "Jazz Night".to_string(),
            description: None,
            date: Utc::now(),
            venue: "Riverside Hall".to_string(),
            capacity_maximum: 10,
            ticket_price: Money::from_cents(2000),
            status: EventStatus::Available,
            artist_ids: vec![],
        }
    }

    fn sample_ticket(event_id: EventId, quantity: u32, status: TicketStatus) -> Ticket {
        Ticket {
            id: TicketId::new(),
            buyer_name: "Ana Souza".to_string(),
            buyer_email: "ana@example.com".to_string(),
            quantity,
            total_price: Money::from_cents(2000 * u64::from(quantity)),
            purchased_at: Utc::now(),
            status,
            event_id,
        }
    }

    #[tokio::test]
    async fn event_status_roundtrip() {
        let store = InMemoryEventStore::new();
        let event = store.insert(sample_event()).await.unwrap();

        store
            .update_status(event.id, EventStatus::SoldOut)
            .await
            .unwrap();

        let reloaded = store.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, EventStatus::SoldOut);
    }

    #[tokio::test]
    async fn sold_count_excludes_cancelled() {
        let tickets = InMemoryTicketStore::new();
        let event_id = EventId::new();

        tickets
            .insert(sample_ticket(event_id, 3, TicketStatus::Reserved))
            .await
            .unwrap();
        tickets
            .insert(sample_ticket(event_id, 2, TicketStatus::Paid))
            .await
            .unwrap();
        tickets
            .insert(sample_ticket(event_id, 4, TicketStatus::Cancelled))
            .await
            .unwrap();
        // Unrelated event must not count.
        tickets
            .insert(sample_ticket(EventId::new(), 7, TicketStatus::Paid))
            .await
            .unwrap();

        let sold = tickets
            .count_for_event_excluding(event_id, TicketStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(sold, 5);
    }

    #[tokio::test]
    async fn duplicate_email_rejected() {
        let users = InMemoryUserStore::new();
        let user = User {
            id: UserId::new(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "x".to_string(),
            role: crate::types::UserRole::Customer,
        };
        users.insert(user.clone()).await.unwrap();

        let dup = User {
            id: UserId::new(),
            ..user
        };
        let result = users.insert(dup).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn inactive_keys_invisible_to_lookup() {
        let keys = InMemoryApiKeyStore::new();
        let key = ApiKey {
            id: ApiKeyId::new(),
            key: "secret".to_string(),
            user_id: UserId::new(),
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::days(30),
            status: ApiKeyStatus::Active,
        };
        keys.insert(key.clone()).await.unwrap();
        assert!(keys.find_active_by_key("secret").await.unwrap().is_some());

        keys.update_status(key.id, ApiKeyStatus::Revoked)
            .await
            .unwrap();
        assert!(keys.find_active_by_key("secret").await.unwrap().is_none());
    }
}
