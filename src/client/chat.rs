//! Chat session: keeps the transcript, relays the streamed assistant reply
//! into it and persists it to local storage.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

use crate::client::api::{ApiClient, ClientError};
use crate::client::decoder::Utf8StreamDecoder;
use crate::client::local_storage::LocalStorage;
use crate::flows::ChatInput;
use crate::models::{Attachment, ChatMessage, Sender};

pub const CHAT_HISTORY_KEY: &str = "aramiyot_chat_history";
pub const GREETING_ID: &str = "initial-greeting";
pub const GREETING_TEXT: &str = "Hello! I'm Aramiyot's AI Health Assistant. How can I help you today? You can also attach an image if it helps describe your inquiry. Please remember, I provide general guidance and not medical advice.";
const SHORT_GREETING_TEXT: &str = "Hello! I'm Aramiyot's AI Health Assistant. How can I help you today?";
pub const FALLBACK_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again later.";
pub const MAX_ATTACHMENT_BYTES: usize = 5 * 1024 * 1024;
/// Sent in place of a blank inquiry when only an image is attached.
pub const IMAGE_ONLY_INQUIRY: &str = "Please analyze the attached image.";

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error("Please select an image file (e.g., JPG, PNG, GIF), got {0}")]
    NotAnImage(String),
    #[error("Please select an image smaller than 5MB ({size} bytes given)")]
    TooLarge { size: usize },
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyMessage,
}

impl Attachment {
    /// Wraps raw image bytes as an inline data-URI attachment.
    pub fn from_image_bytes(
        name: impl Into<String>,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<Self, AttachmentError> {
        if !mime_type.starts_with("image/") {
            return Err(AttachmentError::NotAnImage(mime_type.to_string()));
        }
        if bytes.len() > MAX_ATTACHMENT_BYTES {
            return Err(AttachmentError::TooLarge { size: bytes.len() });
        }

        Ok(Self {
            kind: "image".to_string(),
            url: format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes)),
            name: Some(name.into()),
        })
    }
}

pub struct ChatSession {
    api: ApiClient,
    storage: Arc<LocalStorage>,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    /// Restores the stored transcript, or seeds the greeting.
    pub fn open(api: ApiClient, storage: Arc<LocalStorage>) -> Self {
        let messages = match storage.get_json::<Vec<ChatMessage>>(CHAT_HISTORY_KEY) {
            Ok(Some(history)) => history,
            Ok(None) => vec![ChatMessage::new(GREETING_ID, GREETING_TEXT, Sender::Ai)],
            Err(e) => {
                tracing::error!("Failed to load chat history: {}", e);
                vec![ChatMessage::new(
                    format!("{}-error", GREETING_ID),
                    SHORT_GREETING_TEXT,
                    Sender::Ai,
                )]
            }
        };

        Self {
            api,
            storage,
            messages,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn persist(&self) {
        let only_greeting = self.messages.len() == 1 && self.messages[0].id.starts_with(GREETING_ID);
        if self.messages.is_empty() || only_greeting {
            return;
        }
        if let Err(e) = self.storage.set_json(CHAT_HISTORY_KEY, &self.messages) {
            tracing::error!("Failed to save chat history: {}", e);
        }
    }

    fn update_message(&mut self, id: &str, text: &str, clear_attachment: bool) {
        if let Some(message) = self.messages.iter_mut().find(|m| m.id == id) {
            message.text = text.to_string();
            if clear_attachment {
                message.attachment = None;
            }
        }
        self.persist();
    }

    /// Sends one turn and streams the reply into the transcript.
    ///
    /// `on_update` sees the transcript after every change. Failures are
    /// rendered into the assistant message; the returned text is its final
    /// content either way.
    pub async fn send<F>(
        &mut self,
        inquiry: &str,
        attachment: Option<Attachment>,
        mut on_update: F,
    ) -> Result<String, ChatError>
    where
        F: FnMut(&[ChatMessage]),
    {
        if inquiry.trim().is_empty() && attachment.is_none() {
            return Err(ChatError::EmptyMessage);
        }

        let photo_data_uri = attachment.as_ref().map(|a| a.url.clone());
        let turn = Uuid::new_v4();

        let mut user_message = ChatMessage::new(format!("{}-user", turn), inquiry, Sender::User);
        user_message.attachment = attachment;
        self.messages.push(user_message);
        self.persist();
        on_update(&self.messages);

        let ai_id = format!("{}-ai", turn);
        self.messages.push(ChatMessage::new(ai_id.clone(), "", Sender::Ai));
        self.persist();
        on_update(&self.messages);

        let inquiry = if inquiry.trim().is_empty() {
            IMAGE_ONLY_INQUIRY
        } else {
            inquiry
        };
        let input = ChatInput {
            inquiry: inquiry.to_string(),
            photo_data_uri,
        };

        let response = match self.api.open_chat_stream(&input).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Error getting AI response: {}", e);
                let text = error_text(&e);
                self.update_message(&ai_id, &text, true);
                on_update(&self.messages);
                return Ok(text);
            }
        };

        let mut body = response.bytes_stream();
        let mut decoder = Utf8StreamDecoder::new();
        let mut streamed = String::new();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    streamed.push_str(&decoder.decode(&bytes));
                    self.update_message(&ai_id, &streamed, false);
                    on_update(&self.messages);
                }
                Err(e) => {
                    tracing::error!("Chat stream failed mid-response: {}", e);
                    self.update_message(&ai_id, FALLBACK_ERROR_TEXT, true);
                    on_update(&self.messages);
                    return Ok(FALLBACK_ERROR_TEXT.to_string());
                }
            }
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            streamed.push_str(&tail);
            self.update_message(&ai_id, &streamed, false);
            on_update(&self.messages);
        }

        Ok(streamed)
    }
}

fn error_text(err: &ClientError) -> String {
    match err {
        ClientError::Api { .. } => err.to_string(),
        _ => FALLBACK_ERROR_TEXT.to_string(),
    }
}
