//! Schema-typed AI operations. Each flow validates its input, renders a
//! prompt, calls the generative backend and coerces the output into its
//! response type.

pub mod chat;
pub mod hospital;
pub mod recommendations;

use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::services::genai_client::{GenAiError, GenerativeBackend, TextStream};

pub use chat::{ChatInput, ChatOutput};
pub use hospital::{HospitalSuggestionInput, HospitalSuggestionOutput};
pub use recommendations::{RecommendationInput, RecommendationOutput};

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Invalid input: {0}")]
    Validation(#[from] validator::ValidationErrors),
    #[error("Generative backend error: {0}")]
    Backend(#[from] GenAiError),
    #[error("Model returned no output for {0}")]
    EmptyOutput(&'static str),
    #[error("Model output does not match the {flow} schema: {message}")]
    InvalidOutput { flow: &'static str, message: String },
}

/// Rejects empty and whitespace-only text.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

pub struct Flows {
    backend: Arc<dyn GenerativeBackend>,
}

impl Flows {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self { backend }
    }

    pub async fn run_chat_flow(&self, input: ChatInput) -> Result<ChatOutput, FlowError> {
        input.validate()?;

        let response = self
            .backend
            .generate(chat::render_prompt(&input))
            .await?
            .ok_or(FlowError::EmptyOutput("chat"))?;

        Ok(ChatOutput { response })
    }

    /// Same prompt as [`Flows::run_chat_flow`], yielding text as it is generated.
    pub async fn stream_chat_flow(&self, input: ChatInput) -> Result<TextStream, FlowError> {
        input.validate()?;
        tracing::debug!(
            "Opening chat stream (attachment: {})",
            input.photo_data_uri.is_some()
        );

        Ok(self
            .backend
            .generate_stream(chat::render_prompt(&input))
            .await?)
    }

    pub async fn run_recommendation_flow(
        &self,
        input: RecommendationInput,
    ) -> Result<RecommendationOutput, FlowError> {
        input.validate()?;

        let raw = self
            .backend
            .generate(recommendations::render_prompt(&input))
            .await?
            .ok_or(FlowError::EmptyOutput("recommendations"))?;

        serde_json::from_str(&raw).map_err(|e| FlowError::InvalidOutput {
            flow: "recommendations",
            message: e.to_string(),
        })
    }

    pub async fn run_hospital_suggestion_flow(
        &self,
        input: HospitalSuggestionInput,
    ) -> Result<HospitalSuggestionOutput, FlowError> {
        input.validate()?;

        let Some(raw) = self
            .backend
            .generate(hospital::render_prompt(&input))
            .await?
        else {
            tracing::warn!("Hospital suggestion flow produced no output, using fallback");
            return Ok(HospitalSuggestionOutput::fallback());
        };

        let parsed: hospital::RawHospitalOutput =
            serde_json::from_str(&raw).map_err(|e| FlowError::InvalidOutput {
                flow: "hospital suggestions",
                message: e.to_string(),
            })?;

        Ok(parsed.normalize())
    }
}
