//! Custom Axum extractors.
//!
//! Currently a single extractor lives here: [`ClientIdentity`], the
//! partition key used for per-client rate limiting.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

/// The resolved identity of the calling client.
///
/// Resolution order is deterministic because it decides which rate-limit
/// bucket a request is charged to:
///
/// 1. `X-API-Key` header, namespaced as `apikey:<value>`
/// 2. First entry of `X-Forwarded-For`
/// 3. `X-Real-IP`
/// 4. The connection's peer address (loopback when unavailable)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity(pub String);

impl ClientIdentity {
    /// Resolve a client identity from request headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        if let Some(api_key) = headers.get("X-API-Key").and_then(|v| v.to_str().ok()) {
            if !api_key.is_empty() {
                return Self(format!("apikey:{api_key}"));
            }
        }

        if let Some(forwarded) = headers.get("X-Forwarded-For").and_then(|v| v.to_str().ok()) {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Self(first.to_string());
                }
            }
        }

        if let Some(real_ip) = headers.get("X-Real-IP").and_then(|v| v.to_str().ok()) {
            if !real_ip.is_empty() {
                return Self(real_ip.to_string());
            }
        }

        // Peer address would come from ConnectInfo middleware; loopback is
        // the deterministic fallback when the server runs without it.
        Self("127.0.0.1".to_string())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn api_key_takes_precedence() {
        let headers = headers(&[
            ("X-API-Key", "abc123"),
            ("X-Forwarded-For", "203.0.113.1"),
            ("X-Real-IP", "198.51.100.42"),
        ]);
        assert_eq!(
            ClientIdentity::from_headers(&headers),
            ClientIdentity("apikey:abc123".to_string())
        );
    }

    #[test]
    fn first_forwarded_ip_wins() {
        let headers = headers(&[("X-Forwarded-For", "203.0.113.1, 198.51.100.1")]);
        assert_eq!(
            ClientIdentity::from_headers(&headers),
            ClientIdentity("203.0.113.1".to_string())
        );
    }

    #[test]
    fn real_ip_fallback() {
        let headers = headers(&[("X-Real-IP", "198.51.100.42")]);
        assert_eq!(
            ClientIdentity::from_headers(&headers),
            ClientIdentity("198.51.100.42".to_string())
        );
    }

    #[test]
    fn loopback_when_nothing_present() {
        assert_eq!(
            ClientIdentity::from_headers(&HeaderMap::new()),
            ClientIdentity("127.0.0.1".to_string())
        );
    }
}
