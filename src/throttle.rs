//! Per-client, per-endpoint rate limiting.
//!
//! Fixed-window counters keyed by `(client identity, endpoint path)`. Each
//! key owns its own locked window cell; the registry lock is held only long
//! enough to fetch or create a cell, so unrelated clients never serialize
//! on each other's counters.
//!
//! The [`RateLimitLayer`] middleware consults the limiter before the rest
//! of the stack runs and stamps `X-RateLimit-Limit` / `X-RateLimit-Remaining`
//! on every response, throttled or not, so clients can self-throttle.

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::extractors::ClientIdentity;
use axum::{
    extract::Request,
    http::HeaderValue,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service};

/// Response header carrying the window ceiling.
pub const HEADER_LIMIT: &str = "X-RateLimit-Limit";
/// Response header carrying the requests left in the current window.
pub const HEADER_REMAINING: &str = "X-RateLimit-Remaining";

/// How often (in admissions) the stale-window sweep runs.
const SWEEP_INTERVAL: u64 = 256;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// The ceiling for this endpoint's window.
    pub limit: u32,
    /// Requests left in the current window after this one.
    pub remaining: u32,
}

/// A single counting window.
#[derive(Debug)]
struct FixedWindow {
    started: Instant,
    count: u32,
}

/// Fixed-window rate limiter over `(client, endpoint)` keys.
///
/// Windows are created lazily on first use and swept once they have been
/// idle for two full window durations, keeping the registry bounded by the
/// set of recently active clients.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Arc<Mutex<FixedWindow>>>>,
    admissions: AtomicU64,
}

impl RateLimiter {
    /// Create a limiter from configuration.
    #[must_use]
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
            admissions: AtomicU64::new(0),
        }
    }

    /// The configured window duration.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_secs(self.config.window_secs)
    }

    /// Check and record one request for `client` against `endpoint`.
    ///
    /// The window resets (count to zero, start to now) before the
    /// increment when its duration has elapsed, so a burst arriving at
    /// reset time is charged to the new window. Rejected requests are
    /// counted too, matching the header contract: `remaining` is zero for
    /// every rejected call.
    pub fn admit(&self, client: &ClientIdentity, endpoint: &str) -> RateDecision {
        let limit = self.config.limit_for(endpoint);
        let window = self.window();
        let key = format!("{}:{endpoint}", client.0);

        self.maybe_sweep(window);

        let cell = {
            let mut registry = match self.windows.lock() {
                Ok(guard) => guard,
                // A poisoned registry means a panic elsewhere; fail open
                // rather than throttling every client forever.
                Err(poisoned) => poisoned.into_inner(),
            };
            Arc::clone(registry.entry(key).or_insert_with(|| {
                Arc::new(Mutex::new(FixedWindow {
                    started: Instant::now(),
                    count: 0,
                }))
            }))
        };

        let mut state = match cell.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.started.elapsed() > window {
            state.count = 0;
            state.started = Instant::now();
        }
        state.count = state.count.saturating_add(1);

        let allowed = state.count <= limit;
        let remaining = limit.saturating_sub(state.count);

        if !allowed {
            metrics::counter!("ticketing_rate_limited_total").increment(1);
            tracing::warn!(
                client = %client.0,
                endpoint = %endpoint,
                count = state.count,
                limit = limit,
                "Rate limit exceeded"
            );
        }

        RateDecision {
            allowed,
            limit,
            remaining,
        }
    }

    /// Drop windows idle for at least two full window durations.
    ///
    /// Runs every [`SWEEP_INTERVAL`] admissions; cells currently locked by
    /// another caller are in active use and are kept.
    fn maybe_sweep(&self, window: Duration) {
        if self.admissions.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL != 0 {
            return;
        }
        let horizon = window.saturating_mul(2);
        let mut registry = match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        registry.retain(|_, cell| match cell.try_lock() {
            Ok(state) => state.started.elapsed() <= horizon,
            Err(_) => true,
        });
    }
}

/// Create a layer enforcing the rate limiter on every request.
#[must_use]
pub fn rate_limit_layer(limiter: Arc<RateLimiter>) -> RateLimitLayer {
    RateLimitLayer { limiter }
}

/// Layer wiring [`RateLimiter`] into the middleware stack.
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter>,
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitMiddleware {
            inner,
            limiter: Arc::clone(&self.limiter),
        }
    }
}

/// Middleware service enforcing the rate limiter.
#[derive(Clone)]
pub struct RateLimitMiddleware<S> {
    inner: S,
    limiter: Arc<RateLimiter>,
}

impl<S> Service<Request> for RateLimitMiddleware<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let client = ClientIdentity::from_headers(req.headers());
        let endpoint = req.uri().path().to_string();
        let decision = self.limiter.admit(&client, &endpoint);

        if !decision.allowed {
            let mut response = AppError::rate_limited().into_response();
            stamp_headers(&mut response, decision);
            return Box::pin(async move { Ok(response) });
        }

        let fut = self.inner.call(req);
        Box::pin(async move {
            let mut response = fut.await?;
            stamp_headers(&mut response, decision);
            Ok(response)
        })
    }
}

/// Attach the rate-limit headers to a response.
fn stamp_headers(response: &mut Response, decision: RateDecision) {
    let headers = response.headers_mut();
    headers.insert(HEADER_LIMIT, HeaderValue::from(decision.limit));
    headers.insert(HEADER_REMAINING, HeaderValue::from(decision.remaining));
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request as HttpRequest, http::StatusCode, routing::get};
    use proptest::prelude::*;
    use tower::ServiceExt;

    fn limiter(limit: u32, window_secs: u64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            window_secs,
            default_limit: limit,
            endpoint_limits: HashMap::new(),
        })
    }

    fn client(name: &str) -> ClientIdentity {
        ClientIdentity(name.to_string())
    }

    #[test]
    fn allows_up_to_limit_then_rejects() {
        let limiter = limiter(3, 60);
        let c = client("10.0.0.1");

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.admit(&c, "/api/v1/artists");
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let rejected = limiter.admit(&c, "/api/v1/artists");
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
        assert_eq!(rejected.limit, 3);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = limiter(1, 60);
        assert!(limiter.admit(&client("a"), "/x").allowed);
        assert!(!limiter.admit(&client("a"), "/x").allowed);
        // Different client, same endpoint.
        assert!(limiter.admit(&client("b"), "/x").allowed);
        // Same client, different endpoint.
        assert!(limiter.admit(&client("a"), "/y").allowed);
    }

    #[tokio::test]
    async fn window_elapses_and_resets() {
        let limiter = limiter(1, 1);
        let c = client("10.0.0.9");

        assert!(limiter.admit(&c, "/x").allowed);
        assert!(!limiter.admit(&c, "/x").allowed);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let decision = limiter.admit(&c, "/x").allowed;
        assert!(decision, "first request after the window must be admitted");
    }

    #[tokio::test]
    async fn middleware_stamps_headers_and_rejects() {
        let limiter = Arc::new(limiter(2, 60));
        let app = Router::new()
            .route("/test", get(|| async { "ok" }))
            .layer(rate_limit_layer(limiter));

        for remaining in ["1", "0"] {
            let response = app
                .clone()
                .oneshot(
                    HttpRequest::builder()
                        .uri("/test")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()[HEADER_LIMIT], "2");
            assert_eq!(response.headers()[HEADER_REMAINING], remaining);
        }

        let response = app
            .oneshot(
                HttpRequest::builder()
                    .uri("/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[HEADER_REMAINING], "0");
    }

    proptest! {
        /// After `n` calls with ceiling `limit`, the counter arithmetic is
        /// exact: allowed iff the call index is within the ceiling, and
        /// remaining decreases to zero without underflow.
        #[test]
        fn window_arithmetic_holds(limit in 1u32..64, n in 1u32..128) {
            let limiter = limiter(limit, 3600);
            let c = client("prop");
            for i in 1..=n {
                let decision = limiter.admit(&c, "/p");
                prop_assert_eq!(decision.allowed, i <= limit);
                prop_assert_eq!(decision.remaining, limit.saturating_sub(i));
            }
        }
    }
}
