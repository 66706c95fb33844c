use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{ResourceKind, WellnessResource};
use crate::services::genai_client::GenerateRequest;

/// Activity profile used when the user has not typed an interest.
pub const DEFAULT_ACTIVITY: &str = "User is interested in mindfulness, healthy eating, and light yoga. Prefers short articles and guided meditations.";

/// Number of recommendation cards shown to the user.
pub const MAX_CARDS: usize = 3;

const TITLE_LIMIT: usize = 60;
const TITLE_CUT: usize = 57;

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationInput {
    /// Historical activity and preferences of the user.
    #[validate(custom(function = "crate::flows::not_blank", message = "User activity must not be empty"))]
    pub user_activity: String,
}

impl RecommendationInput {
    /// Builds the activity description from an optional free-text interest.
    pub fn for_query(query: Option<&str>) -> Self {
        let user_activity = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => format!(
                "User is specifically interested in: {}. Please provide wellness resources related to these topics.",
                q
            ),
            None => DEFAULT_ACTIVITY.to_string(),
        };
        Self { user_activity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
pub struct RecommendationOutput {
    pub recommendations: Vec<String>,
}

pub fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "recommendations": {
                "type": "array",
                "items": {"type": "string"},
                "description": "An array of personalized wellness resource recommendations."
            }
        },
        "required": ["recommendations"]
    })
}

pub fn render_prompt(input: &RecommendationInput) -> GenerateRequest {
    GenerateRequest::text(format!(
        "You are a wellness expert. Based on the user's past activity and preferences, provide personalized recommendations for wellness resources.\n\n\
         User Activity and Preferences: {}\n\n\
         Recommendations:",
        input.user_activity
    ))
    .with_schema(output_schema())
}

/// Maps the first three recommendations into displayable tip resources.
pub fn recommendation_cards(output: &RecommendationOutput, query: Option<&str>) -> Vec<WellnessResource> {
    let suffix = query.filter(|q| !q.is_empty()).unwrap_or("initial");

    output
        .recommendations
        .iter()
        .take(MAX_CARDS)
        .enumerate()
        .map(|(index, text)| WellnessResource {
            id: format!("PR{}-{}", index + 1, suffix),
            title: card_title(text),
            description: text.clone(),
            image_url: "https://placehold.co/600x400.png".to_string(),
            category: "Personalized".to_string(),
            kind: ResourceKind::Tip,
        })
        .collect()
}

fn card_title(text: &str) -> String {
    if text.chars().count() > TITLE_LIMIT {
        let cut: String = text.chars().take(TITLE_CUT).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
