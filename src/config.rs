//! Configuration management for the ticketing backend.
//!
//! Loads configuration from environment variables with sensible defaults.

use std::collections::HashMap;
use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Per-endpoint rate limiting configuration.
    pub rate_limit: RateLimitConfig,
    /// Idempotency record retention.
    pub idempotency: IdempotencyConfig,
    /// Authentication configuration.
    pub auth: AuthConfig,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

/// Rate limiter configuration.
///
/// Endpoint paths not present in `endpoint_limits` fall back to
/// `default_limit`. Lookup is by exact path first, then by the longest
/// configured prefix, so `/api/v1/apikeys/generate/<id>` matches the
/// `/api/v1/apikeys/generate` entry.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Window duration in seconds.
    pub window_secs: u64,
    /// Requests allowed per window for unlisted endpoints.
    pub default_limit: u32,
    /// Requests allowed per window for specific endpoints.
    pub endpoint_limits: HashMap<String, u32>,
}

/// Idempotency coordinator configuration.
#[derive(Debug, Clone)]
pub struct IdempotencyConfig {
    /// Seconds a cached purchase outcome is retained before eviction.
    pub retention_secs: u64,
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Days until a freshly generated API key expires.
    pub api_key_ttl_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable has a default suitable for local development.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(8080),
            },
            rate_limit: RateLimitConfig {
                window_secs: env::var("RATE_LIMIT_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
                default_limit: env::var("RATE_LIMIT_DEFAULT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(100),
                endpoint_limits: default_endpoint_limits(),
            },
            idempotency: IdempotencyConfig {
                retention_secs: env::var("IDEMPOTENCY_RETENTION_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(86_400), // 24 hours
            },
            auth: AuthConfig {
                api_key_ttl_days: env::var("API_KEY_TTL_DAYS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Endpoint-specific request ceilings per window.
///
/// The purchase endpoint and credential endpoints get tighter limits than
/// the general read surface.
fn default_endpoint_limits() -> HashMap<String, u32> {
    let mut limits = HashMap::new();
    limits.insert("/api/v1/tickets".to_string(), 50);
    limits.insert("/api/v1/apikeys/generate".to_string(), 10);
    limits.insert("/api/v1/auth/login".to_string(), 20);
    limits
}

impl RateLimitConfig {
    /// Resolve the limit for an endpoint path.
    ///
    /// Exact match wins; otherwise the longest configured prefix applies;
    /// otherwise the default limit.
    #[must_use]
    pub fn limit_for(&self, path: &str) -> u32 {
        if let Some(limit) = self.endpoint_limits.get(path) {
            return *limit;
        }
        self.endpoint_limits
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(self.default_limit, |(_, limit)| *limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            window_secs: 60,
            default_limit: 100,
            endpoint_limits: default_endpoint_limits(),
        }
    }

    #[test]
    fn exact_endpoint_limit() {
        assert_eq!(config().limit_for("/api/v1/tickets"), 50);
    }

    #[test]
    fn prefix_endpoint_limit() {
        // Generated key routes carry a user id suffix.
        assert_eq!(config().limit_for("/api/v1/apikeys/generate/abc"), 10);
    }

    #[test]
    fn unlisted_endpoint_uses_default() {
        assert_eq!(config().limit_for("/api/v1/artists"), 100);
    }
}
