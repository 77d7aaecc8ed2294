//! API key management endpoints.
//!
//! - `POST /api/v1/apikeys/generate/:user_id` - generate a key (public, so
//!   a fresh user can bootstrap access)
//! - `GET /api/v1/apikeys/user/:user_id` - list a user's active keys
//! - `DELETE /api/v1/apikeys/:id` - revoke a key

use crate::auth::generate_api_key;
use crate::error::AppError;
use crate::server::AppState;
use crate::types::{ApiKey, ApiKeyId, ApiKeyStatus, UserId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// API key representation returned by the API.
///
/// The key material is only ever shown here, at generation and listing
/// time for the owning user.
#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    /// Identifier.
    pub id: ApiKeyId,
    /// The opaque key material.
    pub key: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Expiry timestamp.
    pub expires_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: ApiKeyStatus,
}

impl From<ApiKey> for ApiKeyResponse {
    fn from(key: ApiKey) -> Self {
        Self {
            id: key.id,
            key: key.key,
            created_at: key.created_at,
            expires_at: key.expires_at,
            status: key.status,
        }
    }
}

/// Generate a new API key for a user.
pub async fn generate_key(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiKeyResponse>), AppError> {
    let user_id = UserId::from_uuid(user_id);
    if state.users.find_by_id(user_id).await?.is_none() {
        return Err(AppError::not_found("User", user_id));
    }

    let now = Utc::now();
    let key = state
        .api_keys
        .insert(ApiKey {
            id: ApiKeyId::new(),
            key: generate_api_key(),
            user_id,
            created_at: now,
            expires_at: now + Duration::days(state.config.auth.api_key_ttl_days),
            status: ApiKeyStatus::Active,
        })
        .await?;

    tracing::info!(user_id = %user_id, key_id = %key.id, "API key generated");
    Ok((StatusCode::CREATED, Json(key.into())))
}

/// List a user's active API keys.
pub async fn list_keys_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<ApiKeyResponse>>, AppError> {
    let keys = state
        .api_keys
        .list_active_for_user(UserId::from_uuid(user_id))
        .await?;
    Ok(Json(keys.into_iter().map(Into::into).collect()))
}

/// Revoke an API key.
pub async fn revoke_key(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let key_id = ApiKeyId::from_uuid(id);
    if state.api_keys.find_by_id(key_id).await?.is_none() {
        return Err(AppError::not_found("ApiKey", id));
    }

    state
        .api_keys
        .update_status(key_id, ApiKeyStatus::Revoked)
        .await?;
    tracing::info!(key_id = %key_id, "API key revoked");
    Ok(StatusCode::NO_CONTENT)
}
