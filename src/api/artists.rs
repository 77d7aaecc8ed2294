//! Artist management endpoints.
//!
//! - `POST /api/v1/artists` - create an artist
//! - `GET /api/v1/artists` - list artists with pagination
//! - `GET /api/v1/artists/search` - filtered search
//! - `GET /api/v1/artists/:id` - artist details
//! - `PUT /api/v1/artists/:id` - update an artist
//! - `DELETE /api/v1/artists/:id` - delete an artist

use super::pagination::{PageQuery, PageResponse};
use super::{ensure_matching_id, validate_name};
use crate::error::AppError;
use crate::server::AppState;
use crate::types::{Artist, ArtistId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Request/Response types
// ============================================================================

/// Request to create an artist.
#[derive(Debug, Deserialize)]
pub struct CreateArtistRequest {
    /// Artist or band name.
    pub name: String,
    /// Musical genre.
    pub genre: String,
    /// Free-form biography.
    pub biography: Option<String>,
}

/// Request to update an artist. Absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateArtistRequest {
    /// Must match the path id when present.
    pub id: Option<Uuid>,
    /// Updated name.
    pub name: Option<String>,
    /// Updated genre.
    pub genre: Option<String>,
    /// Updated biography.
    pub biography: Option<String>,
}

/// Artist representation returned by the API.
#[derive(Debug, Serialize)]
pub struct ArtistResponse {
    /// Identifier.
    pub id: ArtistId,
    /// Artist or band name.
    pub name: String,
    /// Musical genre.
    pub genre: String,
    /// Free-form biography.
    pub biography: Option<String>,
}

impl From<Artist> for ArtistResponse {
    fn from(artist: Artist) -> Self {
        Self {
            id: artist.id,
            name: artist.name,
            genre: artist.genre,
            biography: artist.biography,
        }
    }
}

/// Filters accepted by the artist search endpoint.
#[derive(Debug, Deserialize)]
pub struct ArtistSearchQuery {
    /// Case-insensitive substring match on the name.
    pub name: Option<String>,
    /// Case-insensitive substring match on the genre.
    pub genre: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Create a new artist.
pub async fn create_artist(
    State(state): State<AppState>,
    Json(request): Json<CreateArtistRequest>,
) -> Result<(StatusCode, Json<ArtistResponse>), AppError> {
    validate_name("name", &request.name)?;
    if request.genre.trim().is_empty() {
        return Err(AppError::validation("genre must not be blank"));
    }

    let artist = state
        .artists
        .insert(Artist {
            id: ArtistId::new(),
            name: request.name.trim().to_string(),
            genre: request.genre.trim().to_string(),
            biography: request.biography,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(artist.into())))
}

/// List artists with pagination. Sortable by `name` (default) or `genre`.
pub async fn list_artists(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PageResponse<ArtistResponse>>, AppError> {
    let mut artists = state.artists.list().await?;
    sort_artists(&mut artists, &query);
    let responses: Vec<ArtistResponse> = artists.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &query)))
}

/// Search artists by name and genre substrings, paginated.
pub async fn search_artists(
    State(state): State<AppState>,
    Query(filter): Query<ArtistSearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<PageResponse<ArtistResponse>>, AppError> {
    let mut artists = state.artists.list().await?;

    if let Some(name) = filter.name.as_deref().map(str::to_lowercase) {
        artists.retain(|a| a.name.to_lowercase().contains(&name));
    }
    if let Some(genre) = filter.genre.as_deref().map(str::to_lowercase) {
        artists.retain(|a| a.genre.to_lowercase().contains(&genre));
    }

    sort_artists(&mut artists, &page);
    let responses: Vec<ArtistResponse> = artists.into_iter().map(Into::into).collect();
    Ok(Json(PageResponse::paginate(responses, &page)))
}

/// Get artist details by id.
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArtistResponse>, AppError> {
    let artist = state
        .artists
        .find_by_id(ArtistId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("Artist", id))?;
    Ok(Json(artist.into()))
}

/// Update an artist.
pub async fn update_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateArtistRequest>,
) -> Result<Json<ArtistResponse>, AppError> {
    ensure_matching_id(id, request.id)?;

    let artist_id = ArtistId::from_uuid(id);
    let mut artist = state
        .artists
        .find_by_id(artist_id)
        .await?
        .ok_or_else(|| AppError::not_found("Artist", id))?;

    if let Some(name) = request.name {
        validate_name("name", &name)?;
        artist.name = name.trim().to_string();
    }
    if let Some(genre) = request.genre {
        if genre.trim().is_empty() {
            return Err(AppError::validation("genre must not be blank"));
        }
        artist.genre = genre.trim().to_string();
    }
    if let Some(biography) = request.biography {
        artist.biography = Some(biography);
    }

    let updated = state.artists.update(artist).await?;
    Ok(Json(updated.into()))
}

/// Delete an artist.
pub async fn delete_artist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.artists.delete(ArtistId::from_uuid(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("Artist", id))
    }
}

fn sort_artists(artists: &mut [Artist], query: &PageQuery) {
    match query.sort_field() {
        Some("genre") => artists.sort_by(|a, b| a.genre.cmp(&b.genre)),
        _ => artists.sort_by(|a, b| a.name.cmp(&b.name)),
    }
    if query.is_descending() {
        artists.reverse();
    }
}
