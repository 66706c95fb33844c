use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::services::genai_client::{GenerateRequest, PromptPart};

const PREAMBLE: &str = "You are a helpful AI-powered chatbot that answers general health inquiries and provides basic guidance.
Please remember to only provide general guidance and always recommend consulting with a healthcare professional for specific medical advice.";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatInput {
    /// The health inquiry from the user.
    #[serde(default)]
    #[validate(custom(function = "crate::flows::not_blank", message = "Inquiry must not be empty"))]
    pub inquiry: String,

    /// Optional photo as `data:<mimetype>;base64,<encoded_data>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct ChatOutput {
    pub response: String,
}

/// Splits a `data:<mime>;base64,<data>` URI into `(mime, data)`.
pub fn parse_data_uri(uri: &str) -> Option<(&str, &str)> {
    let rest = uri.strip_prefix("data:")?;
    let (meta, data) = rest.split_once(',')?;
    let mime = meta.strip_suffix(";base64")?;
    if mime.is_empty() || data.is_empty() {
        return None;
    }
    Some((mime, data))
}

/// Renders the chat prompt. Chat is free text in both the single-shot and the
/// streaming mode, so the two produce the same response for the same model.
pub fn render_prompt(input: &ChatInput) -> GenerateRequest {
    let mut parts = vec![PromptPart::Text(format!("{}\n\n", PREAMBLE))];

    if let Some(uri) = input.photo_data_uri.as_deref() {
        match parse_data_uri(uri) {
            Some((mime_type, data)) => {
                parts.push(PromptPart::Text(
                    "The user has attached an image related to their inquiry. Consider this image when formulating your response:\n"
                        .to_string(),
                ));
                parts.push(PromptPart::Media {
                    mime_type: mime_type.to_string(),
                    data: data.to_string(),
                });
                parts.push(PromptPart::Text("\n".to_string()));
            }
            None => tracing::warn!("Ignoring photo attachment that is not a base64 data URI"),
        }
    }

    parts.push(PromptPart::Text(format!("\nUser Inquiry: {}", input.inquiry)));

    GenerateRequest {
        parts,
        response_schema: None,
    }
}
