//! Anonymous identity. A sign-in issues a random user id together with a
//! token binding that id to the server secret; board requests carry the token
//! as a bearer credential.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::dto::ErrorResponse;
use crate::api::routes::AppState;

fn signature(secret: &str, user_id: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b":");
    hasher.update(user_id.as_bytes());
    hex::encode(hasher.finalize())
}

/// Mints a fresh anonymous user id and its token.
pub fn issue_anonymous(secret: &str) -> (String, String) {
    let user_id = Uuid::new_v4().to_string();
    let token = issue_token(secret, &user_id);
    (user_id, token)
}

pub fn issue_token(secret: &str, user_id: &str) -> String {
    format!("{}.{}", user_id, signature(secret, user_id))
}

/// Returns the user id when `token` was issued with `secret`.
pub fn verify_token(secret: &str, token: &str) -> Option<String> {
    let (user_id, provided) = token.rsplit_once('.')?;
    if user_id.is_empty() {
        return None;
    }
    let expected = signature(secret, user_id);

    // Compare without short-circuiting on the first differing byte.
    let matches = expected.len() == provided.len()
        && expected
            .bytes()
            .zip(provided.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0;

    matches.then(|| user_id.to_string())
}

/// The caller's anonymous identity, extracted from `Authorization: Bearer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnonymousUser(pub String);

fn rejection(status: StatusCode, message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse::new(message, serde_json::Value::Null)))
}

impl FromRequestParts<AppState> for AnonymousUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| rejection(StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| rejection(StatusCode::UNAUTHORIZED, "Invalid authorization format"))?;

        let secret = state.config.read().await.token_secret.clone();

        verify_token(&secret, token)
            .map(AnonymousUser)
            .ok_or_else(|| rejection(StatusCode::FORBIDDEN, "Invalid identity token"))
    }
}
