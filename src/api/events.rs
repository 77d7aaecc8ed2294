//! Event management endpoints.
//!
//! - `POST /api/v1/events` - create an event
//! - `GET /api/v1/events` - list events with pagination
//! - `GET /api/v1/events/search` - filtered search
//! - `GET /api/v1/events/:id` - event details
//! - `PUT /api/v1/events/:id` - update an event
//! - `DELETE /api/v1/events/:id` - delete an event
//!
//! Inventory-affecting rules: capacity must be at least 1, the ticket price
//! must be positive, and the `SoldOut` status is owned by the issuance core;
//! an update may set `Available`, `Cancelled`, or `Postponed`.

use super::pagination::{PageQuery, PageResponse};
use super::{ensure_matching_id, validate_name};
use crate::error::AppError;
use crate::server::AppState;
use crate::types::{ArtistId, Event, EventId, EventStatus, Money};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request to create an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Event name.
    pub name: String,
    /// Event description.
    pub description: Option<String>,
    /// Date the event takes place.
    pub date: DateTime<Utc>,
    /// Venue name.
    pub venue: String,
    /// Maximum number of tickets that can be sold.
    pub capacity_maximum: u32,
    /// Price per ticket, in cents.
    pub ticket_price_cents: u64,
    /// Artists performing at this event.
    #[serde(default)]
    pub artist_ids: Vec<Uuid>,
}

/// Request to update an event. Absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    /// Must match the path id when present.
    pub id: Option<Uuid>,
    /// Updated name.
    pub name: Option<String>,
    /// Updated description.
    pub description: Option<String>,
    /// Updated date.
    pub date: Option<DateTime<Utc>>,
    /// Updated venue.
    pub venue: Option<String>,
    /// Updated capacity.
    pub capacity_maximum: Option<u32>,
    /// Updated price per ticket, in cents.
    pub ticket_price_cents: Option<u64>,
    /// Updated status. `SoldOut` is managed by the issuer and rejected here.
    pub status: Option<EventStatus>,
    /// Updated artist line-up.
    pub artist_ids: Option<Vec<Uuid>>,
}

/// Event representation returned by the API.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Identifier.
    pub id: EventId,
    /// Event name.
    pub name: String,
    /// Event description.
    pub description: Option<String>,
    /// Date the event takes place.
    pub date: DateTime<Utc>,
    /// Venue name.
    pub venue: String,
    /// Maximum number of tickets that can be sold.
    pub capacity_maximum: u32,
    /// Price per ticket, in cents.
    pub ticket_price_cents: u64,
    /// Lifecycle status.
    pub status: EventStatus,
    /// Artists performing at this event.
    pub artist_ids: Vec<ArtistId>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            description: event.description,
            date: event.date,
            venue: event.venue,
            capacity_maximum: event.capacity_maximum,
            ticket_price_cents: event.ticket_price.cents(),
            status: event.status,
            artist_ids: event.artist_ids,
        }
    }
}

/// Filters accepted by the event search endpoint.
#[derive(Debug, Deserialize)]
pub struct EventSearchQuery {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    /// Case-insensitive substring match on the venue.
    pub venue: Option<String>,
    /// Exact status match.
    pub status: Option<EventStatus>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new event.
///
/// # Example
///
/// ```bash
/// curl -X POST http://localhost:8080/api/v1/events \
///   -H "X-API-Key: <key>" \
///   -H "Content-Type: application/json" \
///   -d '{
///     "name": "Riverside Festival",
///     "date": "2026-09-12T18:00:00Z",
///     "venue": "Riverside Park",
///     "capacity_maximum": 5000,
///     "ticket_price_cents": 12500
///   }'
/// ```
pub async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    validate_name("name", &request.name)?;
    if request.venue.trim().is_empty() {
        return Err(AppError::validation("venue must not be blank"));
    }
    if request.capacity_maximum < 1 {
        return Err(AppError::validation("capacity_maximum must be at least 1"));
    }
    if request.ticket_price_cents == 0 {
        return Err(AppError::validation("ticket_price_cents must be positive"));
    }

    let artist_ids = resolve_artists(&state, &request.artist_ids).await?;

    let event = state
        .events
        .insert(Event {
            id: EventId::new(),
            name: request.name.trim().to_string(),
            description: request.description,
            date: request.date,
            venue: request.venue.trim().to_string(),
            capacity_maximum: request.capacity_maximum,
            ticket_price: Money::from_cents(request.ticket_price_cents),
            status: EventStatus::Available,
            artist_ids,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(event.into())))
}

/// List events with pagination. Sortable by `name` (default), `date`, or
/// `venue`.
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<EventResponse>>, AppError> {
    let mut events = state.events.list().await?;
    sort_events(&mut events, &query);
    let responses: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &query)))
}

/// Search events by name, venue, and status, paginated.
pub async fn search_events(
    State(state): State<AppState>,
    Query(filter): Query<EventSearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<EventResponse>>, AppError> {
    let mut events = state.events.list().await?;

    if let Some(name) = filter.name.as_deref().map(str::to_lowercase) {
        events.retain(|e| e.name.to_lowercase().contains(&name));
    }
    if let Some(venue) = filter.venue.as_deref().map(str::to_lowercase) {
        events.retain(|e| e.venue.to_lowercase().contains(&venue));
    }
    if let Some(status) = filter.status {
        events.retain(|e| e.status == status);
    }

    sort_events(&mut events, &page);
    let responses: Vec<EventResponse> = events.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &page)))
}

/// Get event details by id.
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, AppError> {
    let event = state
        .events
        .find_by_id(EventId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))?;
    Ok(Json(event.into()))
}

/// Update an event.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateEventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    ensure_matching_id(id, request.id)?;

    let event_id = EventId::from_uuid(id);
    let mut event = state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event", id))?;

    if let Some(name) = request.name {
        validate_name("name", &name)?;
        event.name = name.trim().to_string();
    }
    if let Some(description) = request.description {
        event.description = Some(description);
    }
    if let Some(date) = request.date {
        event.date = date;
    }
    if let Some(venue) = request.venue {
        if venue.trim().is_empty() {
            return Err(AppError::validation("venue must not be blank"));
        }
        event.venue = venue.trim().to_string();
    }
    if let Some(capacity) = request.capacity_maximum {
        if capacity < 1 {
            return Err(AppError::validation("capacity_maximum must be at least 1"));
        }
        event.capacity_maximum = capacity;
    }
    if let Some(price) = request.ticket_price_cents {
        if price == 0 {
            return Err(AppError::validation("ticket_price_cents must be positive"));
        }
        event.ticket_price = Money::from_cents(price);
    }
    if let Some(status) = request.status {
        if status == EventStatus::SoldOut {
            return Err(AppError::validation(
                "SoldOut is managed by ticket issuance",
            ));
        }
        event.status = status;
    }
    if let Some(artist_ids) = request.artist_ids {
        event.artist_ids = resolve_artists(&state, &artist_ids).await?;
    }

    let updated = state.events.update(event).await?;
    Ok(Json(updated.into()))
}

/// Delete an event.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.events.delete(EventId::from_uuid(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Event", id))
    }
}

/// Check that every referenced artist exists.
async fn resolve_artists(state: &AppState, ids: &[Uuid]) -> Result<Vec<ArtistId>, AppError> {
    let mut resolved = Vec::with_capacity(ids.len());
    for id in ids {
        let artist_id = ArtistId::from_uuid(*id);
        if state.artists.find_by_id(artist_id).await?.is_none() {
            return Err(AppError::validation(format!("unknown artist id {id}")));
        }
        resolved.push(artist_id);
    }
    Ok(resolved)
}

fn sort_events(events: &mut [Event], query: &PageQuery) {
    match query.sort_field() {
        Some("date") => events.sort_by_key(|e| e.date),
        Some("venue") => events.sort_by(|a, b| a.venue.cmp(&b.venue)),
        _ => events.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    if query.is_descending() {
        events.reverse();
    }
}
