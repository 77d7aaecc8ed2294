//! Festival ticketing backend.
//!
//! A JSON REST service for festival ticket sales. Most of the surface is
//! ordinary CRUD over artists, events, users, and API keys; the heart of
//! the system is concurrent, capacity-bounded, idempotent ticket issuance
//! behind per-client rate limiting:
//!
//! ```text
//! request ──▶ Rate Limiter ──▶ Idempotency Coordinator ──▶ Ticket Issuer
//!              │ 429 + headers      │ replay cached            │ atomic
//!              ▼                    ▼ outcome                  ▼ reservation
//!            reject             same status/body           201 or 400/404
//! ```
//!
//! - [`throttle`]: fixed-window counters per `(client, endpoint)`; every
//!   response carries `X-RateLimit-Limit` / `X-RateLimit-Remaining`.
//! - [`idempotency`]: at-most-once execution per `Idempotency-Key`;
//!   success and business-failure outcomes replay identically on retry.
//! - [`issuer`]: per-event inventory locks make the capacity check and
//!   ticket creation one atomic reservation, so overselling is impossible
//!   even under racing purchases.
//!
//! State lives behind the repository traits in [`store`]; the bundled
//! implementation is in-memory and the process is the single inventory
//! authority.

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extractors;
pub mod idempotency;
pub mod issuer;
pub mod metrics;
pub mod server;
pub mod store;
pub mod throttle;
pub mod types;

// Re-export key types for convenience
pub use config::Config;
pub use error::AppError;
pub use server::{AppState, build_router};
