use crate::common::{test_config, test_state_with, ScriptedBackend};
use aramiyot::api::{rate_limiter::RateLimiter, routes::create_router};
use aramiyot::config::Config;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

fn recommendation_request(ip: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/recommendations")
        .header("Content-Type", "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(r#"{"userActivity": "walking"}"#))
        .unwrap()
}

#[test]
fn test_rate_limiter_cleanup_keeps_working() {
    let limiter = RateLimiter::new(5);
    let ip = "10.1.1.1".parse().unwrap();
    assert!(limiter.check_rate_limit(ip));

    limiter.cleanup_expired();
    assert!(limiter.check_rate_limit(ip));
}

#[tokio::test]
async fn test_ai_routes_return_429_over_limit() {
    let config = Config {
        ai_rate_limit_per_minute: 2,
        trust_forwarded_for: true,
        ..test_config()
    };
    let backend = Arc::new(ScriptedBackend::structured(Some(
        r#"{"recommendations": ["Stretch"]}"#,
    )));
    let app = create_router(test_state_with(config, backend).await);

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(recommendation_request("198.51.100.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let limited = app
        .clone()
        .oneshot(recommendation_request("198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);

    // Other clients and non-AI routes are unaffected
    let other = app
        .clone()
        .oneshot(recommendation_request("198.51.100.2"))
        .await
        .unwrap();
    assert_eq!(other.status(), StatusCode::OK);

    let health = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-forwarded-for", "198.51.100.1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_forwarded_header_cannot_dodge_limit_by_default() {
    let config = Config {
        ai_rate_limit_per_minute: 1,
        ..test_config()
    };
    let backend = Arc::new(ScriptedBackend::structured(Some(
        r#"{"recommendations": ["Stretch"]}"#,
    )));
    let app = create_router(test_state_with(config, backend).await);

    let first = app
        .clone()
        .oneshot(recommendation_request("198.51.100.1"))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    // A fresh header value is still the same peer
    let spoofed = app
        .oneshot(recommendation_request("198.51.100.99"))
        .await
        .unwrap();
    assert_eq!(spoofed.status(), StatusCode::TOO_MANY_REQUESTS);
}
