//! Authentication endpoint.
//!
//! `POST /api/v1/auth/login` verifies credentials and returns a user
//! summary. Unknown emails and wrong passwords get the same `401` so the
//! endpoint cannot be used to enumerate accounts.

use crate::auth::verify_password;
use crate::error::AppError;
use crate::server::AppState;
use crate::types::{UserId, UserRole};
use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

/// Login credentials.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Registered email.
    pub email: String,
    /// Clear-text password.
    pub password: String,
}

/// Successful login response.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    /// The authenticated user's id.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: UserRole,
}

/// Authenticate a user by email and password.
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .users
        .find_by_email(request.email.trim())
        .await?
        .filter(|user| verify_password(&request.password, &user.password_hash))
        .ok_or_else(|| AppError::unauthorized("Invalid credentials"))?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    }))
}
