//! `POST /api/ai-chat-stream`: relays the chat flow's text increments as a
//! plain-text HTTP body.

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, StreamExt};
use serde_json::Value;
use std::convert::Infallible;

use crate::api::dto::{ChatStreamRequest, ErrorResponse};
use crate::api::routes::{parse_validated, AppState};

fn error_response(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}

#[utoipa::path(
    post,
    path = "/api/ai-chat-stream",
    request_body = ChatStreamRequest,
    responses(
        (status = 200, description = "Response text streamed as UTF-8", body = String, content_type = "text/plain"),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded", body = ErrorResponse),
        (status = 500, description = "Upstream stream could not be opened", body = ErrorResponse)
    )
)]
pub async fn ai_chat_stream(State(state): State<AppState>, body: Bytes) -> Response {
    let input: ChatStreamRequest = match parse_validated(&body) {
        Ok(input) => input,
        Err(rejection) => return rejection.into_response(),
    };

    let upstream = match state.flows.stream_chat_flow(input).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::error!("Failed to open chat stream: {}", e);
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(
                    "Failed to process chat stream",
                    Value::String("The assistant is unavailable right now.".to_string()),
                ),
            );
        }
    };

    // Stop at the first upstream error; the client sees a body that just ends.
    let relay = upstream
        .map(|chunk| match chunk {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!("Chat stream interrupted: {}", e);
                None
            }
        })
        .take_while(|chunk| future::ready(chunk.is_some()))
        .filter_map(|chunk| future::ready(chunk.filter(|text| !text.is_empty())))
        .map(|text| Ok::<_, Infallible>(Bytes::from(text)));

    (
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ),
        ],
        Body::from_stream(relay),
    )
        .into_response()
}
