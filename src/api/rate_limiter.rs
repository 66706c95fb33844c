//! Per-IP rate limiting for the AI endpoints

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{DefaultKeyedRateLimiter, Quota};
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::api::dto::ErrorResponse;

/// Token-bucket limiter keyed by client IP
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<DefaultKeyedRateLimiter<IpAddr>>,
    trust_forwarded_for: bool,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(requests_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: Arc::new(governor::RateLimiter::keyed(Quota::per_minute(per_minute))),
            trust_forwarded_for: false,
        }
    }

    /// Key clients on `x-forwarded-for` instead of the peer address
    pub fn trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Check if request is allowed for given IP
    pub fn check_rate_limit(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }

    /// Drop state for keys whose buckets are full again (call periodically)
    pub fn cleanup_expired(&self) {
        self.limiter.retain_recent();
    }

    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

fn forwarded_ip(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

/// Client IP from the peer address, or from `x-forwarded-for` when the
/// proxy in front is trusted. Falls back to loopback.
fn client_ip(request: &Request, trust_forwarded_for: bool) -> IpAddr {
    trust_forwarded_for
        .then(|| forwarded_ip(request))
        .flatten()
        .or_else(|| {
            request
                .extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
        .unwrap_or_else(|| IpAddr::from([127, 0, 0, 1]))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request, limiter.trust_forwarded_for);

    if limiter.check_rate_limit(ip) {
        next.run(request).await
    } else {
        tracing::warn!("Rate limit exceeded for {}", ip);
        (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse::new(
                "Rate limit exceeded",
                serde_json::Value::String("Please try again later.".to_string()),
            )),
        )
            .into_response()
    }
}
