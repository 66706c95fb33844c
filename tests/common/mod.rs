//! Helpers shared by the unit and integration test targets.
#![allow(dead_code)]

use aramiyot::{
    api::routes::{create_router, AppState},
    config::Config,
    flows::Flows,
    services::genai_client::{GenAiError, GenerateRequest, GenerativeBackend, TextStream},
    storage::{init_db, SeaOrmBoardRepository},
};
use async_trait::async_trait;
use axum::Router;
use std::sync::{Arc, Mutex};

/// Deterministic generative backend. Free-text requests are answered with
/// the scripted chunks, structured requests with the scripted JSON.
#[derive(Default)]
pub struct ScriptedBackend {
    pub chunks: Vec<String>,
    pub json: Option<String>,
    /// Yields an error instead of the chunk at this index.
    pub fail_stream_at: Option<usize>,
    pub fail_open: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn chat(chunks: &[&str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn structured(json: Option<&str>) -> Self {
        Self {
            json: json.map(str::to_string),
            ..Default::default()
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    async fn generate(&self, request: GenerateRequest) -> Result<Option<String>, GenAiError> {
        self.prompts.lock().unwrap().push(request.prompt_text());
        if request.response_schema.is_some() {
            return Ok(self.json.clone());
        }
        let text = self.chunks.concat();
        Ok(if text.is_empty() { None } else { Some(text) })
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextStream, GenAiError> {
        self.prompts.lock().unwrap().push(request.prompt_text());
        if self.fail_open {
            return Err(GenAiError::ApiError {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }

        let items: Vec<Result<String, GenAiError>> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| match self.fail_stream_at {
                Some(at) if at == i => Err(GenAiError::StreamError("connection reset".to_string())),
                _ => Ok(chunk.clone()),
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

pub fn test_config() -> Config {
    Config {
        token_secret: "test-secret-0123456789abcdef0123456789".to_string(),
        ai_rate_limit_per_minute: 1000,
        ..Config::default()
    }
}

pub async fn test_state_with(config: Config, backend: Arc<dyn GenerativeBackend>) -> AppState {
    let db = init_db("sqlite::memory:").await.unwrap();
    AppState::new(
        config,
        Arc::new(Flows::new(backend)),
        Arc::new(SeaOrmBoardRepository::new(db)),
    )
}

pub async fn test_app(backend: Arc<dyn GenerativeBackend>) -> Router {
    create_router(test_state_with(test_config(), backend).await)
}

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
