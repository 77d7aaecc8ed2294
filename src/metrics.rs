//! Business metrics for the ticketing backend.
//!
//! # Exported metrics
//!
//! - `ticketing_purchases_total{outcome}` - purchase attempts by outcome
//!   (`issued`, `rejected`)
//! - `ticketing_idempotent_replays_total` - purchase responses served from
//!   the idempotency cache
//! - `ticketing_rate_limited_total` - requests rejected by the rate limiter

use ::metrics::describe_counter;

/// Register metric descriptions.
///
/// Call once at startup, before any metrics are recorded.
pub fn register_business_metrics() {
    describe_counter!(
        "ticketing_purchases_total",
        "Total purchase attempts by outcome (issued, rejected)"
    );
    describe_counter!(
        "ticketing_idempotent_replays_total",
        "Purchase responses replayed from the idempotency cache"
    );
    describe_counter!(
        "ticketing_rate_limited_total",
        "Requests rejected by the rate limiter"
    );
}
