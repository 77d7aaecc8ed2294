//! Idempotent execution of purchase requests.
//!
//! Clients correlate retries of one logical purchase with an
//! `Idempotency-Key` header. The coordinator guarantees that the guarded
//! operation runs at most once per key within the process: the first caller
//! executes it while holding a per-key lock, and every concurrent or later
//! caller with the same key replays the published outcome, byte for byte.
//!
//! Business failures (not-found, capacity exceeded) are cached exactly like
//! successes so a retry observes the original outcome instead of
//! re-executing the lookup. Internal (5xx) outcomes are never cached; a
//! transient storage failure must not poison a retry key.
//!
//! # Crash semantics
//!
//! At-most-once execution holds only within a live process. A crash between
//! "operation executed" and "result cached" makes a retry execute again;
//! callers needing at-most-once across restarts must put a durable store
//! behind this interface.

use crate::error::AppError;
use axum::{
    Json,
    async_trait,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Request header correlating retries of one logical operation.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// A fully materialized HTTP outcome: status code plus JSON body.
///
/// This is what gets cached and replayed; replaying the whole outcome (not
/// just a status) is what makes retries indistinguishable from the
/// original response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    status: u16,
    body: serde_json::Value,
}

impl StoredResponse {
    /// Build an outcome from a status and JSON body.
    #[must_use]
    pub fn new(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status: status.as_u16(),
            body,
        }
    }

    /// Build an outcome carrying an [`AppError`]'s status and body.
    ///
    /// The body matches what [`AppError`]'s `IntoResponse` produces, so a
    /// replayed failure is identical to the original one.
    #[must_use]
    pub fn from_error(error: &AppError) -> Self {
        Self::new(
            error.status(),
            serde_json::json!({
                "code": error.code(),
                "message": error.message(),
            }),
        )
    }

    /// The HTTP status of this outcome.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Whether this outcome may be cached under an idempotency key.
    ///
    /// Server errors are transient and must stay retryable.
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        self.status < 500
    }
}

impl IntoResponse for StoredResponse {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self.body)).into_response()
    }
}

/// Per-key record: the outcome slot plus its insertion time.
#[derive(Debug)]
struct Record {
    cell: Arc<tokio::sync::Mutex<Option<StoredResponse>>>,
    created_at: Instant,
}

/// Coordinates at-most-once execution per idempotency key.
///
/// Records are retained for a configurable period and swept on use, so the
/// table stays bounded by recent client activity.
#[derive(Debug)]
pub struct IdempotencyCoordinator {
    retention: Duration,
    records: Mutex<HashMap<String, Record>>,
}

impl IdempotencyCoordinator {
    /// Create a coordinator retaining records for `retention`.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached outcome for `key`, if one has been published.
    ///
    /// An operation still in flight counts as absent; callers wanting to
    /// join it use [`execute_once`](Self::execute_once).
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<StoredResponse> {
        let records = match self.records.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let record = records.get(key)?;
        record
            .cell
            .try_lock()
            .ok()
            .and_then(|slot| slot.as_ref().cloned())
    }

    /// Execute `op` at most once for `key`.
    ///
    /// The first caller for a key runs `op` while holding that key's lock
    /// and publishes the outcome; racing callers block on the same lock and
    /// replay the published outcome once it is available. Non-cacheable
    /// (5xx) outcomes leave the slot empty so a later retry re-executes.
    pub async fn execute_once<F, Fut>(&self, key: &str, op: F) -> StoredResponse
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = StoredResponse> + Send,
    {
        let cell = {
            let mut records = match self.records.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Self::sweep(&mut records, self.retention);
            Arc::clone(
                &records
                    .entry(key.to_string())
                    .or_insert_with(|| Record {
                        cell: Arc::new(tokio::sync::Mutex::new(None)),
                        created_at: Instant::now(),
                    })
                    .cell,
            )
        };

        let mut slot = cell.lock().await;
        if let Some(cached) = slot.as_ref() {
            metrics::counter!("ticketing_idempotent_replays_total").increment(1);
            tracing::debug!(key = %key, status = cached.status, "Replaying cached outcome");
            return cached.clone();
        }

        let outcome = op().await;
        if outcome.is_cacheable() {
            *slot = Some(outcome.clone());
        } else {
            tracing::warn!(
                key = %key,
                status = outcome.status,
                "Not caching server-error outcome"
            );
        }
        outcome
    }

    /// Drop expired records. Records whose operation is still running are
    /// locked and therefore kept.
    fn sweep(records: &mut HashMap<String, Record>, retention: Duration) {
        records.retain(|_, record| {
            if record.created_at.elapsed() <= retention {
                return true;
            }
            record.cell.try_lock().is_err()
        });
    }
}

/// Extractor for the `Idempotency-Key` header.
///
/// Requests without a token (or with a blank one) are rejected with `400`
/// before any business logic runs.
#[derive(Debug, Clone)]
pub struct IdempotencyToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for IdempotencyToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .ok_or_else(|| AppError::bad_request("Missing Idempotency-Key header"))?
            .to_str()
            .map_err(|_| AppError::bad_request("Invalid Idempotency-Key header value"))?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(AppError::bad_request("Idempotency-Key must not be blank"));
        }
        if token.len() > 255 {
            return Err(AppError::bad_request(
                "Idempotency-Key must be at most 255 characters",
            ));
        }

        Ok(Self(token))
    }
}
