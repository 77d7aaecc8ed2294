//! Health check endpoints.
//!
//! Used by load balancers and monitoring systems. Both are public and
//! exempt from authentication.

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Readiness response body.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Always `"ready"` while the process serves requests.
    pub status: &'static str,
}

/// Simple liveness check.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness check.
///
/// State is process-local, so readiness coincides with liveness; the
/// endpoint exists for orchestration symmetry.
#[allow(clippy::unused_async)]
pub async fn readiness_check() -> (StatusCode, Json<ReadyResponse>) {
    (StatusCode::OK, Json(ReadyResponse { status: "ready" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simple_health_check() {
        let (status, body) = health_check().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }
}
