use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use validator::Validate;

use crate::{
    api::{
        chat_stream,
        dto::*,
        rate_limiter::{rate_limit_middleware, RateLimiter},
    },
    auth::{self, AnonymousUser},
    config::Config,
    flows::{
        recommendations::recommendation_cards, FlowError, Flows, HospitalSuggestionInput,
        HospitalSuggestionOutput, RecommendationInput, RecommendationOutput,
    },
    models::{
        catalog::{self, HOSPITALS},
        Board, Hospital, WellnessResource,
    },
    storage::{BoardRepository, RepositoryError},
};

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,
    pub flows: Arc<Flows>,
    pub boards: Arc<dyn BoardRepository>,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config, flows: Arc<Flows>, boards: Arc<dyn BoardRepository>) -> Self {
        let limiter = RateLimiter::new(config.ai_rate_limit_per_minute)
            .trust_forwarded_for(config.trust_forwarded_for);
        Self {
            config: Arc::new(RwLock::new(config)),
            flows,
            boards,
            limiter,
        }
    }
}

/// Reads a JSON body and validates it, producing the `formErrors` /
/// `fieldErrors` shape on failure.
pub(crate) fn parse_validated<T>(body: &Bytes) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let input: T = serde_json::from_slice(body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_body(e.to_string())),
        )
    })?;

    input.validate().map_err(|errors| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_fields(&errors)),
        )
    })?;

    Ok(input)
}

fn flow_error(flow: &str, err: FlowError) -> ApiError {
    match err {
        FlowError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_fields(&errors)),
        ),
        other => {
            tracing::error!("{} flow failed: {}", flow, other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    format!("Failed to generate {}", flow),
                    Value::String("Please try again later.".to_string()),
                )),
            )
        }
    }
}

fn repository_error(err: RepositoryError) -> ApiError {
    match err {
        RepositoryError::Forbidden(id) => (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "Board belongs to another user",
                Value::String(id),
            )),
        ),
        RepositoryError::InvalidInput(message) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid input", Value::String(message))),
        ),
        other => {
            tracing::error!("Board storage failed: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Board storage failed", Value::Null)),
            )
        }
    }
}

// ==================== IDENTITY ====================

#[utoipa::path(
    post,
    path = "/api/auth/anonymous",
    responses((status = 200, description = "New anonymous identity", body = AnonymousSessionResponse))
)]
pub async fn anonymous_session(State(state): State<AppState>) -> Json<AnonymousSessionResponse> {
    let secret = state.config.read().await.token_secret.clone();
    let (user_id, token) = auth::issue_anonymous(&secret);
    tracing::info!("Issued anonymous identity {}", user_id);

    Json(AnonymousSessionResponse { user_id, token })
}

// ==================== BOARDS ====================

pub async fn list_boards(
    State(state): State<AppState>,
    AnonymousUser(user_id): AnonymousUser,
) -> Result<Json<Vec<Board>>, ApiError> {
    let boards = state
        .boards
        .list_boards(&user_id)
        .await
        .map_err(repository_error)?;
    Ok(Json(boards))
}

pub async fn put_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    AnonymousUser(user_id): AnonymousUser,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let board: Board = serde_json::from_slice(&body).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::invalid_body(e.to_string())),
        )
    })?;

    if board.id != board_id {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Invalid input",
                Value::String("board id does not match the path".to_string()),
            )),
        ));
    }

    state
        .boards
        .put_board(&user_id, &board)
        .await
        .map_err(repository_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_board(
    State(state): State<AppState>,
    Path(board_id): Path<String>,
    AnonymousUser(user_id): AnonymousUser,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .boards
        .delete_board(&user_id, &board_id)
        .await
        .map_err(repository_error)?;

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Board not found", Value::String(board_id))),
        ))
    }
}

// ==================== AI FLOWS ====================

#[utoipa::path(
    post,
    path = "/api/recommendations",
    request_body = RecommendationInput,
    responses(
        (status = 200, description = "Recommendation titles", body = RecommendationOutput),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn recommendations(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<RecommendationOutput>, ApiError> {
    let input: RecommendationInput = parse_validated(&body)?;
    let output = state
        .flows
        .run_recommendation_flow(input)
        .await
        .map_err(|e| flow_error("recommendations", e))?;
    Ok(Json(output))
}

pub async fn recommendation_cards_for_query(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Vec<WellnessResource>>, ApiError> {
    let request: RecommendationCardsRequest = if body.is_empty() {
        RecommendationCardsRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::invalid_body(e.to_string())),
            )
        })?
    };
    let query = request.query.as_deref().map(str::trim).filter(|q| !q.is_empty());

    let output = state
        .flows
        .run_recommendation_flow(RecommendationInput::for_query(query))
        .await
        .map_err(|e| flow_error("recommendations", e))?;

    Ok(Json(recommendation_cards(&output, query)))
}

#[utoipa::path(
    post,
    path = "/api/hospital-suggestions",
    request_body = HospitalSuggestionInput,
    responses(
        (status = 200, description = "At most three suggestions", body = HospitalSuggestionOutput),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn hospital_suggestions(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<HospitalSuggestionOutput>, ApiError> {
    let input: HospitalSuggestionInput = parse_validated(&body)?;
    let output = state
        .flows
        .run_hospital_suggestion_flow(input)
        .await
        .map_err(|e| flow_error("hospital suggestions", e))?;
    Ok(Json(output))
}

// ==================== CATALOG ====================

pub async fn list_resources() -> Json<Vec<WellnessResource>> {
    Json(catalog::all_resources().cloned().collect())
}

pub async fn get_resource(Path(id): Path<String>) -> Result<Json<WellnessResource>, ApiError> {
    catalog::find_resource(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("Resource not found", Value::String(id))),
            )
        })
}

#[utoipa::path(
    get,
    path = "/api/hospitals",
    responses((status = 200, description = "Hospital directory", body = [Hospital]))
)]
pub async fn list_hospitals() -> Json<Vec<Hospital>> {
    Json(HOSPITALS.to_vec())
}

pub async fn health() -> &'static str {
    "OK"
}

#[derive(OpenApi)]
#[openapi(
    paths(
        chat_stream::ai_chat_stream,
        anonymous_session,
        recommendations,
        hospital_suggestions,
        list_hospitals
    ),
    components(schemas(
        ErrorResponse,
        AnonymousSessionResponse,
        RecommendationCardsRequest
    ))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: AppState) -> Router {
    // Nothing else holds the lock while the router is assembled.
    let (body_limit, cors_enabled) = match state.config.try_read() {
        Ok(config) => (config.max_request_bytes, config.cors_enabled),
        Err(_) => {
            let defaults = Config::default();
            (defaults.max_request_bytes, defaults.cors_enabled)
        }
    };

    let ai_routes = Router::new()
        .route("/api/ai-chat-stream", post(chat_stream::ai_chat_stream))
        .route("/api/recommendations", post(recommendations))
        .route(
            "/api/recommendations/cards",
            post(recommendation_cards_for_query),
        )
        .route("/api/hospital-suggestions", post(hospital_suggestions))
        .route_layer(middleware::from_fn_with_state(
            state.limiter.clone(),
            rate_limit_middleware,
        ));

    let router = Router::new()
        .merge(ai_routes)
        .route("/api/auth/anonymous", post(anonymous_session))
        .route("/api/boards", get(list_boards))
        .route("/api/boards/{id}", put(put_board).delete(delete_board))
        .route("/api/resources", get(list_resources))
        .route("/api/resources/{id}", get(get_resource))
        .route("/api/hospitals", get(list_hospitals))
        .route("/api-docs/openapi.json", get(openapi_json))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_enabled {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
