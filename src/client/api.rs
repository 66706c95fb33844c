//! HTTP client for the Aramiyot service.

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::api::dto::{AnonymousSessionResponse, RecommendationCardsRequest};
use crate::client::local_storage::StorageError;
use crate::flows::{
    ChatInput, HospitalSuggestionInput, HospitalSuggestionOutput, RecommendationInput,
    RecommendationOutput,
};
use crate::models::{Board, Hospital, WellnessResource};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API Error: {status} {reason}. {details}")]
    Api {
        status: u16,
        reason: String,
        details: String,
    },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Not signed in")]
    NotSignedIn,
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Builds a [`ClientError::Api`] from a non-success response.
async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let reason = status.canonical_reason().unwrap_or("").to_string();

    let details = match response.json::<Value>().await {
        Ok(body) => match (body.get("details"), body.get("error")) {
            (Some(Value::String(details)), _) => details.clone(),
            (_, Some(Value::String(error))) => error.clone(),
            _ => "Unknown error occurred".to_string(),
        },
        Err(_) => "Unknown error occurred".to_string(),
    };

    ClientError::Api {
        status: status.as_u16(),
        reason,
        details,
    }
}

async fn ok_or_api_error(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(api_error(response).await)
    }
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    Ok(ok_or_api_error(response).await?.json().await?)
}

#[derive(Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String, ClientError> {
        self.token
            .as_ref()
            .map(|t| format!("Bearer {}", t))
            .ok_or(ClientError::NotSignedIn)
    }

    /// Requests a fresh anonymous identity and keeps its token for board calls.
    pub async fn sign_in_anonymously(&mut self) -> Result<AnonymousSessionResponse, ClientError> {
        let response = self
            .client
            .post(self.url("/api/auth/anonymous"))
            .send()
            .await?;
        let session: AnonymousSessionResponse = json_body(response).await?;

        tracing::info!("Signed in anonymously as {}", session.user_id);
        self.token = Some(session.token.clone());
        Ok(session)
    }

    // ==================== BOARDS ====================

    pub async fn list_boards(&self) -> Result<Vec<Board>, ClientError> {
        let response = self
            .client
            .get(self.url("/api/boards"))
            .header("Authorization", self.bearer()?)
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn put_board(&self, board: &Board) -> Result<(), ClientError> {
        let response = self
            .client
            .put(self.url(&format!("/api/boards/{}", board.id)))
            .header("Authorization", self.bearer()?)
            .json(board)
            .send()
            .await?;
        ok_or_api_error(response).await?;
        Ok(())
    }

    /// Returns `false` when the server had no such board.
    pub async fn delete_board(&self, board_id: &str) -> Result<bool, ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/api/boards/{}", board_id)))
            .header("Authorization", self.bearer()?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        ok_or_api_error(response).await?;
        Ok(true)
    }

    // ==================== AI ====================

    /// Opens the chat stream. The returned response has a success status and
    /// an unread body.
    pub async fn open_chat_stream(&self, input: &ChatInput) -> Result<Response, ClientError> {
        let response = self
            .client
            .post(self.url("/api/ai-chat-stream"))
            .json(input)
            .send()
            .await?;
        ok_or_api_error(response).await
    }

    pub async fn recommendations(
        &self,
        input: &RecommendationInput,
    ) -> Result<RecommendationOutput, ClientError> {
        let response = self
            .client
            .post(self.url("/api/recommendations"))
            .json(input)
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn recommendation_cards(
        &self,
        query: Option<&str>,
    ) -> Result<Vec<WellnessResource>, ClientError> {
        let response = self
            .client
            .post(self.url("/api/recommendations/cards"))
            .json(&RecommendationCardsRequest {
                query: query.map(str::to_string),
            })
            .send()
            .await?;
        json_body(response).await
    }

    pub async fn hospital_suggestions(
        &self,
        input: &HospitalSuggestionInput,
    ) -> Result<HospitalSuggestionOutput, ClientError> {
        let response = self
            .client
            .post(self.url("/api/hospital-suggestions"))
            .json(input)
            .send()
            .await?;
        json_body(response).await
    }

    // ==================== CATALOG ====================

    pub async fn resources(&self) -> Result<Vec<WellnessResource>, ClientError> {
        json_body(self.client.get(self.url("/api/resources")).send().await?).await
    }

    pub async fn resource(&self, id: &str) -> Result<Option<WellnessResource>, ClientError> {
        let response = self
            .client
            .get(self.url(&format!("/api/resources/{}", id)))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        json_body(response).await.map(Some)
    }

    pub async fn hospitals(&self) -> Result<Vec<Hospital>, ClientError> {
        json_body(self.client.get(self.url("/api/hospitals")).send().await?).await
    }
}
