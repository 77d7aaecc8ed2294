//! User management endpoints.
//!
//! - `POST /api/v1/users` - register a user (public)
//! - `GET /api/v1/users` - list users
//! - `GET /api/v1/users/:id` - user details
//! - `PUT /api/v1/users/:id` - update a user
//! - `DELETE /api/v1/users/:id` - delete a user
//!
//! Passwords never appear in responses; they are stored as salted digests.

use super::{ensure_matching_id, validate_email, validate_name};
use crate::auth::hash_password;
use crate::error::AppError;
use crate::server::AppState;
use crate::types::{User, UserId, UserRole};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to register a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Display name.
    pub name: String,
    /// Unique email address.
    pub email: String,
    /// Clear-text password; hashed before storage.
    pub password: String,
    /// Role; defaults to `Customer`.
    pub role: Option<UserRole>,
}

/// Request to update a user. Absent fields keep their current value.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// Must match the path id when present.
    pub id: Option<Uuid>,
    /// Updated name.
    pub name: Option<String>,
    /// Updated email.
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// Updated role.
    pub role: Option<UserRole>,
}

/// User representation returned by the API.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// Identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: UserRole,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }
    }
}

/// Register a new user.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    validate_name("name", &request.name)?;
    validate_email(&request.email)?;
    if request.password.len() < 8 {
        return Err(AppError::validation(
            "password must be at least 8 characters",
        ));
    }

    let user = state
        .users
        .insert(User {
            id: UserId::new(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            password_hash: hash_password(&request.password),
            role: request.role.unwrap_or(UserRole::Customer),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

/// List all users.
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let mut users = state.users.list().await?;
    users.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// Get user details by id.
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .users
        .find_by_id(UserId::from_uuid(id))
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;
    Ok(Json(user.into()))
}

/// Update a user.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    ensure_matching_id(id, request.id)?;

    let user_id = UserId::from_uuid(id);
    let mut user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))?;

    if let Some(name) = request.name {
        validate_name("name", &name)?;
        user.name = name.trim().to_string();
    }
    if let Some(email) = request.email {
        validate_email(&email)?;
        user.email = email.trim().to_string();
    }
    if let Some(password) = request.password {
        if password.len() < 8 {
            return Err(AppError::validation(
                "password must be at least 8 characters",
            ));
        }
        user.password_hash = hash_password(&password);
    }
    if let Some(role) = request.role {
        user.role = role;
    }

    let updated = state.users.update(user).await?;
    Ok(Json(updated.into()))
}

/// Delete a user.
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.users.delete(UserId::from_uuid(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("User", id))
    }
}
