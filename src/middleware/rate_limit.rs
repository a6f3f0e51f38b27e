//! Fixed-window rate limiting keyed by client IP.
//!
//! Every response on a limited path carries the standard headers:
//!
//! - `RateLimit-Limit`: requests allowed per window
//! - `RateLimit-Remaining`: requests left in the current window
//! - `RateLimit-Reset`: seconds until the window resets
//!
//! plus `Retry-After` when the request was rejected.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::Response,
};
use portico_cache::{RateLimitStore, WindowState};
use portico_config::RateLimitConfig;
use portico_core::AppError;
use tracing::warn;

use crate::pipeline::{BoxFuture, Exchange, Flow, Stage, StageResult};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later";

pub mod headers {
    use axum::http::HeaderName;

    pub const LIMIT: HeaderName = HeaderName::from_static("ratelimit-limit");
    pub const REMAINING: HeaderName = HeaderName::from_static("ratelimit-remaining");
    pub const RESET: HeaderName = HeaderName::from_static("ratelimit-reset");
}

const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Quota observed in `before`, reported in `after`.
#[derive(Debug, Clone, Copy)]
struct Quota {
    limit: u64,
    remaining: u64,
    reset_secs: u64,
}

impl Quota {
    fn new(limit: u64, state: WindowState) -> Self {
        Self {
            limit,
            remaining: limit.saturating_sub(state.count),
            reset_secs: state.resets_in.as_millis().div_ceil(1000) as u64,
        }
    }
}

pub struct RateLimit {
    store: Arc<dyn RateLimitStore>,
    window: Duration,
    max_requests: u64,
    path_prefix: &'static str,
}

impl RateLimit {
    pub fn new(store: Arc<dyn RateLimitStore>, config: &RateLimitConfig) -> Self {
        Self {
            store,
            window: config.window,
            max_requests: config.max_requests,
            path_prefix: "/api",
        }
    }

    fn applies_to(&self, path: &str) -> bool {
        path.strip_prefix(self.path_prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    }
}

/// Client identity: the last `X-Forwarded-For` hop (one trusted proxy),
/// then `X-Real-IP`, then the socket peer.
pub fn client_key(request: &Request) -> String {
    let headers = request.headers();

    let forwarded = headers
        .get(X_FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());
    if let Some(hop) = forwarded {
        return hop.to_string();
    }

    let real_ip = headers
        .get(X_REAL_IP)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl Stage for RateLimit {
    fn name(&self) -> &'static str {
        "rate-limit"
    }

    fn before<'a>(
        &'a self,
        exchange: &'a mut Exchange,
        request: &'a mut Request,
    ) -> BoxFuture<'a, StageResult> {
        Box::pin(async move {
            if !self.applies_to(request.uri().path()) {
                return Ok(Flow::Continue);
            }

            let key = client_key(request);
            let state = match self.store.increment(&key, self.window).await {
                Ok(state) => state,
                Err(err) => {
                    warn!(error = %err, key = %key, "Rate limit store unavailable, allowing request");
                    return Ok(Flow::Continue);
                }
            };

            exchange
                .extensions
                .insert(Quota::new(self.max_requests, state));

            if state.count > self.max_requests {
                return Err(AppError::rate_limited(RATE_LIMITED_MESSAGE));
            }
            Ok(Flow::Continue)
        })
    }

    fn after(&self, exchange: &Exchange, response: &mut Response) {
        let Some(quota) = exchange.extensions.get::<Quota>() else {
            return;
        };

        let limited = response.status() == StatusCode::TOO_MANY_REQUESTS;
        let map = response.headers_mut();
        map.insert(headers::LIMIT, HeaderValue::from(quota.limit));
        map.insert(headers::REMAINING, HeaderValue::from(quota.remaining));
        map.insert(headers::RESET, HeaderValue::from(quota.reset_secs));
        if limited {
            map.insert(header::RETRY_AFTER, HeaderValue::from(quota.reset_secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use portico_cache::MemoryRateLimitStore;

    fn limiter(max_requests: u64) -> RateLimit {
        let config = RateLimitConfig {
            window: Duration::from_secs(60),
            max_requests,
            redis_url: None,
        };
        RateLimit::new(Arc::new(MemoryRateLimitStore::new()), &config)
    }

    fn request(uri: &str, forwarded_for: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(ip) = forwarded_for {
            builder = builder.header(X_FORWARDED_FOR, ip);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_applies_only_under_api_prefix() {
        let limiter = limiter(1);
        assert!(limiter.applies_to("/api"));
        assert!(limiter.applies_to("/api/v1/users"));
        assert!(!limiter.applies_to("/health"));
        assert!(!limiter.applies_to("/apiary"));
    }

    #[test]
    fn test_client_key_prefers_last_forwarded_hop() {
        let req = request("/api", Some("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_key(&req), "10.0.0.1");
    }

    #[test]
    fn test_client_key_falls_back_to_peer_address() {
        let mut req = request("/api", None);
        assert_eq!(client_key(&req), "unknown");

        let addr: SocketAddr = "192.0.2.7:5000".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        assert_eq!(client_key(&req), "192.0.2.7");
    }

    #[test]
    fn test_client_key_uses_real_ip_header() {
        let req = axum::http::Request::builder()
            .uri("/api")
            .header(X_REAL_IP, "198.51.100.3")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "198.51.100.3");
    }

    #[tokio::test]
    async fn test_rejects_after_ceiling_and_reports_quota() {
        let limiter = limiter(2);

        for expected_remaining in [1u64, 0] {
            let mut req = request("/api/v1/health", Some("1.1.1.1"));
            let mut exchange = Exchange::new(&req);
            assert!(matches!(
                limiter.before(&mut exchange, &mut req).await,
                Ok(Flow::Continue)
            ));

            let mut response = Response::new(Body::empty());
            limiter.after(&exchange, &mut response);
            assert_eq!(
                response.headers()[headers::REMAINING],
                expected_remaining.to_string().as_str()
            );
            assert!(!response.headers().contains_key(header::RETRY_AFTER));
        }

        let mut req = request("/api/v1/health", Some("1.1.1.1"));
        let mut exchange = Exchange::new(&req);
        let err = limiter.before(&mut exchange, &mut req).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.message(), RATE_LIMITED_MESSAGE);

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
        limiter.after(&exchange, &mut response);
        assert_eq!(response.headers()[headers::LIMIT], "2");
        assert_eq!(response.headers()[headers::REMAINING], "0");
        assert!(response.headers().contains_key(header::RETRY_AFTER));
    }

    #[tokio::test]
    async fn test_clients_are_counted_separately() {
        let limiter = limiter(1);

        for ip in ["1.1.1.1", "2.2.2.2"] {
            let mut req = request("/api/v1/health", Some(ip));
            let mut exchange = Exchange::new(&req);
            assert!(limiter.before(&mut exchange, &mut req).await.is_ok());
        }
    }
}
