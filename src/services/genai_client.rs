use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::pin::Pin;

#[derive(Debug, thiserror::Error)]
pub enum GenAiError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Stream error: {0}")]
    StreamError(String),
}

/// Incremental text produced by a streaming generation, in model order.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, GenAiError>> + Send>>;

/// One piece of a rendered prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    /// Inline media, base64 encoded.
    Media { mime_type: String, data: String },
}

#[derive(Debug, Clone, Default)]
pub struct GenerateRequest {
    pub parts: Vec<PromptPart>,
    /// JSON schema the output must follow; `None` requests free text.
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::Text(prompt.into())],
            response_schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Concatenated text parts; media parts are skipped.
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                PromptPart::Text(t) => Some(t.as_str()),
                PromptPart::Media { .. } => None,
            })
            .collect()
    }
}

/// The generative-AI collaborator behind every flow.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Single-shot generation. `Ok(None)` means the model produced no output.
    async fn generate(&self, request: GenerateRequest) -> Result<Option<String>, GenAiError>;

    /// Streaming generation of free text.
    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextStream, GenAiError>;
}

/// Client for a Gemini-compatible `generateContent` API.
#[derive(Clone)]
pub struct GenAiClient {
    client: reqwest::Client,
    model_endpoint: String,
    api_key: Option<String>,
}

impl GenAiClient {
    /// `model_endpoint` is `{base}/models/{model}`.
    pub fn new(model_endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model_endpoint: model_endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn post(&self, url: String) -> reqwest::RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.header("x-goog-api-key", key),
            None => builder,
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GenAiError> {
        if !response.status().is_success() {
            return Err(GenAiError::ApiError {
                status: response.status().as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl GenerativeBackend for GenAiClient {
    async fn generate(&self, request: GenerateRequest) -> Result<Option<String>, GenAiError> {
        let body = GenerateContentRequest::from(&request);

        let response = self
            .post(format!("{}:generateContent", self.model_endpoint))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed.text();
        tracing::debug!("generateContent returned {} chars", text.len());

        Ok(if text.trim().is_empty() { None } else { Some(text) })
    }

    async fn generate_stream(&self, request: GenerateRequest) -> Result<TextStream, GenAiError> {
        let body = GenerateContentRequest::from(&request);

        let response = self
            .post(format!("{}:streamGenerateContent?alt=sse", self.model_endpoint))
            .json(&body)
            .send()
            .await?;
        let response = Self::check(response).await?;

        let chunks = response
            .bytes_stream()
            .eventsource()
            .filter_map(|event| async move {
                match event {
                    Ok(event) => {
                        let data = event.data.trim();
                        if data.is_empty() || data == "[DONE]" {
                            return None;
                        }
                        match serde_json::from_str::<GenerateContentResponse>(data) {
                            Ok(chunk) => Some(Ok(chunk.text())),
                            Err(e) => Some(Err(GenAiError::InvalidResponse(format!(
                                "{}: {}",
                                e, data
                            )))),
                        }
                    }
                    Err(e) => Some(Err(GenAiError::StreamError(e.to_string()))),
                }
            });

        Ok(Box::pin(chunks))
    }
}

// Request/Response Models
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum Part {
    Text(String),
    InlineData(InlineData),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
}

impl From<&GenerateRequest> for GenerateContentRequest {
    fn from(request: &GenerateRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|p| match p {
                PromptPart::Text(text) => Part::Text(text.clone()),
                PromptPart::Media { mime_type, data } => Part::InlineData(InlineData {
                    mime_type: mime_type.clone(),
                    data: data.clone(),
                }),
            })
            .collect();

        Self {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: request.response_schema.clone().map(|schema| GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: schema,
            }),
        }
    }
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts joined.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default()
    }
}
