pub mod genai_client;

// Re-export for convenience
pub use genai_client::{
    GenAiClient, GenAiError, GenerateRequest, GenerativeBackend, PromptPart, TextStream,
};
