use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use utoipa::ToSchema;

// ==================== REQUEST DTOs ====================

/// Body of `POST /api/ai-chat-stream`.
pub type ChatStreamRequest = crate::flows::ChatInput;

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RecommendationCardsRequest {
    /// Free-text interest; the default activity profile is used when absent.
    #[serde(default)]
    pub query: Option<String>,
}

// ==================== RESPONSE DTOs ====================

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[schema(value_type = Object)]
    pub details: Value,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, details: Value) -> Self {
        Self {
            error: error.into(),
            details,
        }
    }

    /// Input that could not be read at all (bad JSON, wrong types).
    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::new(
            "Invalid input",
            json!({ "formErrors": [message.into()], "fieldErrors": {} }),
        )
    }

    /// Input that parsed but failed field validation.
    pub fn invalid_fields(errors: &validator::ValidationErrors) -> Self {
        let mut field_errors = Map::new();
        for (field, errs) in errors.field_errors() {
            let messages: Vec<Value> = errs
                .iter()
                .map(|e| {
                    Value::String(
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string()),
                    )
                })
                .collect();
            field_errors.insert(camel_case(&field), Value::Array(messages));
        }

        Self::new(
            "Invalid input",
            json!({ "formErrors": [], "fieldErrors": field_errors }),
        )
    }
}

/// Field names on the wire are camelCase; validator reports Rust names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousSessionResponse {
    pub user_id: String,
    pub token: String,
}
