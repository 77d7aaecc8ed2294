//! Ticket endpoints, including the purchase endpoint.
//!
//! - `POST /api/v1/tickets` - purchase tickets (idempotent, see below)
//! - `GET /api/v1/tickets` - list tickets with pagination
//! - `GET /api/v1/tickets/search` - filtered search
//! - `GET /api/v1/tickets/:id` - ticket details
//! - `PUT /api/v1/tickets/:id/status` - transition a ticket's status
//! - `DELETE /api/v1/tickets/:id` - delete a ticket
//!
//! # Purchase idempotency
//!
//! `POST /api/v1/tickets` requires an `Idempotency-Key` header. Retries
//! carrying the same key replay the original response - status code and
//! body - without touching inventory again. Business rejections (`404`
//! unknown event, `400` capacity exceeded) replay the same way; only
//! server errors stay retryable.

use super::pagination::{PageQuery, PageResponse};
use super::{validate_email, validate_name};
use crate::error::AppError;
use crate::idempotency::{IdempotencyToken, StoredResponse};
use crate::issuer::PurchaseOrder;
use crate::server::AppState;
use crate::types::{EventId, Ticket, TicketId, TicketStatus};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request to purchase tickets for an event.
#[derive(Debug, Deserialize)]
pub struct PurchaseTicketRequest {
    /// The event to buy tickets for.
    pub event_id: Uuid,
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer email.
    pub buyer_email: String,
    /// Number of admissions requested.
    pub quantity: u32,
}

/// Ticket representation returned by the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct TicketResponse {
    /// Identifier.
    pub id: TicketId,
    /// Buyer name.
    pub buyer_name: String,
    /// Buyer email.
    pub buyer_email: String,
    /// Number of admissions.
    pub quantity: u32,
    /// Total price in cents.
    pub total_price_cents: u64,
    /// Purchase timestamp.
    pub purchased_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: TicketStatus,
    /// Owning event.
    pub event_id: EventId,
}

impl From<Ticket> for TicketResponse {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            buyer_name: ticket.buyer_name,
            buyer_email: ticket.buyer_email,
            quantity: ticket.quantity,
            total_price_cents: ticket.total_price.cents(),
            purchased_at: ticket.purchased_at,
            status: ticket.status,
            event_id: ticket.event_id,
        }
    }
}

/// Filters accepted by the ticket search endpoint.
#[derive(Debug, Deserialize)]
pub struct TicketSearchQuery {
    /// Case-insensitive substring match on the buyer email.
    pub email: Option<String>,
    /// Exact status match.
    pub status: Option<TicketStatus>,
    /// Tickets belonging to this event.
    pub event_id: Option<Uuid>,
}

/// Query parameter carrying the target status for a transition.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    /// The status to transition to.
    pub status: TicketStatus,
}

// ============================================================================
// Handlers
// ============================================================================

/// Purchase tickets for an event.
///
/// Validation failures are returned immediately; everything after the
/// idempotency boundary runs at most once per key.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/tickets \
///   -H "X-API-Key: <key>" \
///   -H "Idempotency-Key: 550e8400-e29b-41d4-a716-446655440000" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "event_id": "0d4e1ca2-7f6b-4f3e-9a52-1f1bb0a07a40",
///     "buyer_name": "Ana Souza",
///     "buyer_email": "ana@example.com",
///     "quantity": 2
///   }'
/// ```
pub async fn purchase_ticket(
    State(state): State<AppState>,
    token: IdempotencyToken,
    Json(request): Json<PurchaseTicketRequest>,
) -> Result<Response, AppError> {
    validate_name("buyer_name", &request.buyer_name)?;
    validate_email(&request.buyer_email)?;
    if request.quantity < 1 {
        return Err(AppError::validation("quantity must be at least 1"));
    }

    let order = PurchaseOrder {
        event_id: EventId::from_uuid(request.event_id),
        buyer_name: request.buyer_name.trim().to_string(),
        buyer_email: request.buyer_email.trim().to_string(),
        quantity: request.quantity,
    };

    let issuer = Arc::clone(&state.issuer);
    let outcome = state
        .idempotency
        .execute_once(&token.0, move || async move {
            match issuer.purchase(order).await {
                Ok(ticket) => created_response(ticket),
                Err(err) => StoredResponse::from_error(&AppError::from(err)),
            }
        })
        .await;

    Ok(outcome.into_response())
}

/// List tickets with pagination. Sorted by purchase time; `sort=email`
/// sorts by buyer email instead.
pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<TicketResponse>>, AppError> {
    let mut tickets = state.tickets.list().await?;
    sort_tickets(&mut tickets, &query);
    let responses: Vec<TicketResponse> = tickets.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &query)))
}

/// Search tickets by buyer email, status, and event, paginated.
pub async fn search_tickets(
    State(state): State<AppState>,
    Query(filter): Query<TicketSearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<TicketResponse>>, AppError> {
    let mut tickets = state.tickets.list().await?;

    if let Some(email) = filter.email.as_deref().map(str::to_lowercase) {
        tickets.retain(|t| t.buyer_email.to_lowercase().contains(&email));
    }
    if let Some(status) = filter.status {
        tickets.retain(|t| t.status == status);
    }
    if let Some(event_id) = filter.event_id {
        let event_id = EventId::from_uuid(event_id);
        tickets.retain(|t| t.event_id == event_id);
    }

    sort_tickets(&mut tickets, &page);
    let responses: Vec<TicketResponse> = tickets.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &page)))
}

/// Get ticket details by id.
pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .tickets
        .find_by_id(TicketId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("Ticket", id))?;
    Ok(Json(ticket.into()))
}

/// Transition a ticket's status.
///
/// Routed through the issuer so cancelling a ticket frees its inventory
/// and can reopen a sold-out event.
pub async fn update_ticket_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<TicketResponse>, AppError> {
    let ticket = state
        .issuer
        .update_ticket_status(TicketId::from_uuid(id), query.status)
        .await?;
    Ok(Json(ticket.into()))
}

/// Delete a ticket, freeing its inventory.
pub async fn delete_ticket(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.issuer.delete_ticket(TicketId::from_uuid(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Materialize a created ticket as the cacheable `201` outcome.
fn created_response(ticket: Ticket) -> StoredResponse {
    match serde_json::to_value(TicketResponse::from(ticket)) {
        Ok(body) => StoredResponse::new(StatusCode::CREATED, body),
        Err(err) => StoredResponse::from_error(
            &AppError::internal("Failed to serialize ticket").with_source(err.into()),
        ),
    }
}

fn sort_tickets(tickets: &mut [Ticket], query: &PageQuery) {
    match query.sort_field() {
        Some("email") => tickets.sort_by(|a, b| a.buyer_email.cmp(&b.buyer_email)),
        _ => tickets.sort_by_key(|t| t.purchased_at),
    }
    if query.is_descending() {
        tickets.reverse();
    }
}
