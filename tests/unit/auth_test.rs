use crate::common::{test_app, test_config, ScriptedBackend};
use aramiyot::auth::{issue_anonymous, issue_token, verify_token};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use std::sync::Arc;
use tower::ServiceExt;

fn boards_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri("/api/boards");
    if let Some(value) = authorization {
        builder = builder.header("Authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

#[test]
fn test_token_is_bound_to_user_and_secret() {
    let secret = test_config().token_secret;
    let (user_id, token) = issue_anonymous(&secret);

    assert!(token.starts_with(&user_id));
    assert_eq!(verify_token(&secret, &token).as_deref(), Some(user_id.as_str()));
    assert_eq!(verify_token("another-secret-0123456789abcdef0123", &token), None);
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let app = test_app(Arc::new(ScriptedBackend::default())).await;
    let response = app.oneshot(boards_request(None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_bearer_header_is_unauthorized() {
    let app = test_app(Arc::new(ScriptedBackend::default())).await;
    let response = app
        .oneshot(boards_request(Some("Basic dXNlcjpwYXNz")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_forged_token_is_forbidden() {
    let app = test_app(Arc::new(ScriptedBackend::default())).await;
    let forged = issue_token("not-the-server-secret-0123456789abc", "someone");
    let response = app
        .oneshot(boards_request(Some(&format!("Bearer {}", forged))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_issued_token_is_accepted() {
    let app = test_app(Arc::new(ScriptedBackend::default())).await;
    let (_, token) = issue_anonymous(&test_config().token_secret);
    let response = app
        .oneshot(boards_request(Some(&format!("Bearer {}", token))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
