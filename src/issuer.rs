//! Capacity-bounded ticket issuance.
//!
//! The issuer is the only writer of event inventory. Every inventory
//! mutation for an event runs under that event's own async lock, which
//! turns the capacity check plus ticket creation into one atomic
//! reservation: two purchases racing for the last unit cannot both
//! succeed. A plain count-then-insert sequence without the lock is the
//! race this module exists to close.

use crate::error::AppError;
use crate::store::{EventStore, StoreError, TicketStore};
use crate::types::{Event, EventId, EventStatus, Ticket, TicketId, TicketStatus};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// A validated purchase order, ready for issuance.
#[derive(Debug, Clone)]
pub struct PurchaseOrder {
    /// The event to buy tickets for.
    pub event_id: EventId,
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer email.
    pub buyer_email: String,
    /// Number of admissions requested.
    pub quantity: u32,
}

/// Reasons a purchase (or inventory-touching transition) is rejected.
#[derive(Debug, Error)]
pub enum IssueError {
    /// The event does not exist.
    #[error("Event with id {0} not found")]
    EventNotFound(EventId),

    /// The ticket does not exist.
    #[error("Ticket with id {0} not found")]
    TicketNotFound(TicketId),

    /// The event's status forbids sales.
    #[error("Event is sold out")]
    EventSoldOut,

    /// The event was cancelled.
    #[error("Event is cancelled")]
    EventCancelled,

    /// Granting the requested quantity would exceed capacity.
    #[error("Maximum event capacity exceeded")]
    CapacityExceeded {
        /// Quantity the buyer asked for.
        requested: u32,
        /// Units still available.
        available: u32,
    },

    /// Total price computation overflowed.
    #[error("requested quantity is too large")]
    PriceOverflow,

    /// The storage layer failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IssueError> for AppError {
    fn from(err: IssueError) -> Self {
        use axum::http::StatusCode;
        match err {
            IssueError::EventNotFound(id) => Self::not_found("Event", id),
            IssueError::TicketNotFound(id) => Self::not_found("Ticket", id),
            IssueError::EventSoldOut => Self::new(
                StatusCode::BAD_REQUEST,
                "Event is sold out".to_string(),
                "SOLD_OUT".to_string(),
            ),
            IssueError::EventCancelled => Self::new(
                StatusCode::BAD_REQUEST,
                "Event is cancelled".to_string(),
                "EVENT_CANCELLED".to_string(),
            ),
            IssueError::CapacityExceeded { .. } => Self::new(
                StatusCode::BAD_REQUEST,
                "Maximum event capacity exceeded".to_string(),
                "CAPACITY_EXCEEDED".to_string(),
            ),
            IssueError::PriceOverflow => Self::validation("quantity is too large"),
            IssueError::Store(store) => store.into(),
        }
    }
}

/// Issues tickets against bounded event inventory.
///
/// Holds one async lock per event; the lock registry grows with the number
/// of events touched, each entry a pair of pointers.
pub struct TicketIssuer {
    events: Arc<dyn EventStore>,
    tickets: Arc<dyn TicketStore>,
    locks: Mutex<HashMap<EventId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TicketIssuer {
    /// Create an issuer over the given stores.
    #[must_use]
    pub fn new(events: Arc<dyn EventStore>, tickets: Arc<dyn TicketStore>) -> Self {
        Self {
            events,
            tickets,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Purchase tickets for an event.
    ///
    /// Steps, each short-circuiting on failure: resolve the event, check
    /// its status, check remaining capacity, create the ticket
    /// (`Reserved`, total = quantity × unit price), and flip the event to
    /// `SoldOut` once the sold count reaches capacity. The whole sequence
    /// holds the event's inventory lock.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError`] for unknown events, closed events, exhausted
    /// capacity, or storage failures.
    pub async fn purchase(&self, order: PurchaseOrder) -> Result<Ticket, IssueError> {
        let result = self.purchase_locked(&order).await;
        match &result {
            Ok(ticket) => {
                metrics::counter!("ticketing_purchases_total", "outcome" => "issued").increment(1);
                tracing::info!(
                    ticket_id = %ticket.id,
                    event_id = %order.event_id,
                    quantity = order.quantity,
                    "Ticket issued"
                );
            }
            Err(err) => {
                metrics::counter!("ticketing_purchases_total", "outcome" => "rejected")
                    .increment(1);
                tracing::info!(
                    event_id = %order.event_id,
                    quantity = order.quantity,
                    reason = %err,
                    "Purchase rejected"
                );
            }
        }
        result
    }

    async fn purchase_locked(&self, order: &PurchaseOrder) -> Result<Ticket, IssueError> {
        let lock = self.event_lock(order.event_id);
        let _guard = lock.lock().await;

        let event = self
            .events
            .find_by_id(order.event_id)
            .await?
            .ok_or(IssueError::EventNotFound(order.event_id))?;

        match event.status {
            EventStatus::SoldOut => return Err(IssueError::EventSoldOut),
            EventStatus::Cancelled => return Err(IssueError::EventCancelled),
            EventStatus::Available | EventStatus::Postponed => {}
        }

        let sold = self
            .tickets
            .count_for_event_excluding(event.id, TicketStatus::Cancelled)
            .await?;
        if sold.saturating_add(order.quantity) > event.capacity_maximum {
            return Err(IssueError::CapacityExceeded {
                requested: order.quantity,
                available: event.capacity_maximum.saturating_sub(sold),
            });
        }

        let total_price = event
            .ticket_price
            .checked_mul(order.quantity)
            .ok_or(IssueError::PriceOverflow)?;

        let ticket = self
            .tickets
            .insert(Ticket {
                id: TicketId::new(),
                buyer_name: order.buyer_name.clone(),
                buyer_email: order.buyer_email.clone(),
                quantity: order.quantity,
                total_price,
                purchased_at: Utc::now(),
                status: TicketStatus::Reserved,
                event_id: event.id,
            })
            .await?;

        self.reconcile_event_status(&event).await?;
        Ok(ticket)
    }

    /// Transition a ticket's status, reconciling event inventory.
    ///
    /// Cancelling a ticket frees its quantity; a sold-out event regains
    /// `Available` status when capacity reopens.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::TicketNotFound`] for unknown tickets and
    /// propagates storage failures.
    pub async fn update_ticket_status(
        &self,
        ticket_id: TicketId,
        status: TicketStatus,
    ) -> Result<Ticket, IssueError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(IssueError::TicketNotFound(ticket_id))?;

        let lock = self.event_lock(ticket.event_id);
        let _guard = lock.lock().await;

        self.tickets.update_status(ticket_id, status).await?;
        if let Some(event) = self.events.find_by_id(ticket.event_id).await? {
            self.reconcile_event_status(&event).await?;
        }

        self.tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(IssueError::TicketNotFound(ticket_id))
    }

    /// Delete a ticket, freeing its inventory.
    ///
    /// # Errors
    ///
    /// Returns [`IssueError::TicketNotFound`] for unknown tickets and
    /// propagates storage failures.
    pub async fn delete_ticket(&self, ticket_id: TicketId) -> Result<(), IssueError> {
        let ticket = self
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(IssueError::TicketNotFound(ticket_id))?;

        let lock = self.event_lock(ticket.event_id);
        let _guard = lock.lock().await;

        if !self.tickets.delete(ticket_id).await? {
            return Err(IssueError::TicketNotFound(ticket_id));
        }
        if let Some(event) = self.events.find_by_id(ticket.event_id).await? {
            self.reconcile_event_status(&event).await?;
        }
        Ok(())
    }

    /// Fetch (or create) the inventory lock for an event.
    fn event_lock(&self, event_id: EventId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            locks
                .entry(event_id)
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Recompute the sold count and align the event's status with it.
    ///
    /// Must be called with the event's inventory lock held.
    async fn reconcile_event_status(&self, event: &Event) -> Result<(), IssueError> {
        let sold = self
            .tickets
            .count_for_event_excluding(event.id, TicketStatus::Cancelled)
            .await?;

        if sold >= event.capacity_maximum && event.status == EventStatus::Available {
            self.events
                .update_status(event.id, EventStatus::SoldOut)
                .await?;
            tracing::info!(event_id = %event.id, sold = sold, "Event sold out");
        } else if sold < event.capacity_maximum && event.status == EventStatus::SoldOut {
            self.events
                .update_status(event.id, EventStatus::Available)
                .await?;
            tracing::info!(event_id = %event.id, sold = sold, "Event capacity reopened");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::memory::{InMemoryEventStore, InMemoryTicketStore};
    use crate::types::Money;

    fn order(event_id: EventId, quantity: u32) -> PurchaseOrder {
        PurchaseOrder {
            event_id,
            buyer_name: "Rui Costa".to_string(),
            buyer_email: "rui@example.com".to_string(),
            quantity,
        }
    }

    async fn setup(capacity: u32) -> (Arc<TicketIssuer>, Arc<InMemoryEventStore>, EventId) {
        let events = Arc::new(InMemoryEventStore::new());
        let tickets = Arc::new(InMemoryTicketStore::new());
        let event = events
            .insert(Event {
                id: EventId::new(),
                name: "Open Air".to_string(),
                description: None,
                date: Utc::now(),
                venue: "Harbor Stage".to_string(),
                capacity_maximum: capacity,
                ticket_price: Money::from_cents(1500),
                status: EventStatus::Available,
                artist_ids: vec![],
            })
            .await
            .unwrap();
        let issuer = Arc::new(TicketIssuer::new(events.clone(), tickets));
        (issuer, events, event.id)
    }

    #[tokio::test]
    async fn purchase_creates_reserved_ticket_with_total_price() {
        let (issuer, _, event_id) = setup(10).await;

        let ticket = issuer.purchase(order(event_id, 3)).await.unwrap();
        assert_eq!(ticket.status, TicketStatus::Reserved);
        assert_eq!(ticket.total_price, Money::from_cents(4500));
        assert_eq!(ticket.quantity, 3);
    }

    #[tokio::test]
    async fn unknown_event_is_rejected() {
        let (issuer, _, _) = setup(10).await;
        let result = issuer.purchase(order(EventId::new(), 1)).await;
        assert!(matches!(result, Err(IssueError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn exhausting_capacity_flips_event_to_sold_out() {
        let (issuer, events, event_id) = setup(5).await;

        issuer.purchase(order(event_id, 3)).await.unwrap();
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::Available);

        issuer.purchase(order(event_id, 2)).await.unwrap();
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::SoldOut);

        let result = issuer.purchase(order(event_id, 1)).await;
        assert!(matches!(result, Err(IssueError::EventSoldOut)));
    }

    #[tokio::test]
    async fn partial_overflow_is_rejected_without_partial_issue() {
        let (issuer, events, event_id) = setup(5).await;

        issuer.purchase(order(event_id, 4)).await.unwrap();
        let result = issuer.purchase(order(event_id, 2)).await;
        assert!(matches!(
            result,
            Err(IssueError::CapacityExceeded {
                requested: 2,
                available: 1
            })
        ));

        // Nothing was issued and the event is still open.
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::Available);
    }

    #[tokio::test]
    async fn cancelled_event_rejects_purchases() {
        let (issuer, events, event_id) = setup(5).await;
        events
            .update_status(event_id, EventStatus::Cancelled)
            .await
            .unwrap();
        let result = issuer.purchase(order(event_id, 1)).await;
        assert!(matches!(result, Err(IssueError::EventCancelled)));
    }

    #[tokio::test]
    async fn racing_purchases_for_last_unit_issue_exactly_one_ticket() {
        let (issuer, events, event_id) = setup(1).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let issuer = Arc::clone(&issuer);
            handles.push(tokio::spawn(async move {
                issuer.purchase(order(event_id, 1)).await
            }));
        }

        let issued = futures::future::join_all(handles)
            .await
            .into_iter()
            .filter(|result| result.as_ref().is_ok_and(|purchase| purchase.is_ok()))
            .count();

        assert_eq!(issued, 1, "capacity 1 must yield exactly one ticket");
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::SoldOut);
    }

    #[tokio::test]
    async fn cancelling_a_ticket_reopens_capacity() {
        let (issuer, events, event_id) = setup(2).await;

        let ticket = issuer.purchase(order(event_id, 2)).await.unwrap();
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::SoldOut);

        issuer
            .update_ticket_status(ticket.id, TicketStatus::Cancelled)
            .await
            .unwrap();
        let event = events.find_by_id(event_id).await.unwrap().unwrap();
        assert_eq!(event.status, EventStatus::Available);

        // The freed capacity can be sold again.
        issuer.purchase(order(event_id, 2)).await.unwrap();
    }
}
