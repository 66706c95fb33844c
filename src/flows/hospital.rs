use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::catalog::hospital_directory_summary;
use crate::models::HospitalSuggestion;
use crate::services::genai_client::GenerateRequest;

pub const MAX_SUGGESTIONS: usize = 3;

pub const NO_OUTPUT_ADVICE: &str = "I am sorry, I could not generate specific suggestions at this time. Please try rephrasing your request or consult a medical professional directly.";

pub const DEFAULT_ADVICE: &str = "Remember, this is general guidance. Always consult with a qualified healthcare professional for diagnosis and treatment. Check hospital and doctor availability directly.";

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSuggestionInput {
    #[validate(custom(function = "crate::flows::not_blank", message = "Please describe your symptoms or needs"))]
    pub symptoms_or_needs: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_specialty: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_preference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HospitalSuggestionOutput {
    pub suggestions: Vec<HospitalSuggestion>,
    pub additional_advice: String,
}

impl HospitalSuggestionOutput {
    pub fn fallback() -> Self {
        Self {
            suggestions: Vec::new(),
            additional_advice: NO_OUTPUT_ADVICE.to_string(),
        }
    }
}

/// What the model may send back: the schema asks for a list, but a lone
/// object or a missing field are tolerated.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHospitalOutput {
    #[serde(default)]
    suggestions: Option<OneOrMany>,
    #[serde(default)]
    additional_advice: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    Many(Vec<HospitalSuggestion>),
    One(HospitalSuggestion),
}

impl RawHospitalOutput {
    pub fn normalize(self) -> HospitalSuggestionOutput {
        let mut suggestions = match self.suggestions {
            Some(OneOrMany::Many(list)) => list,
            Some(OneOrMany::One(single)) => vec![single],
            None => Vec::new(),
        };
        suggestions.truncate(MAX_SUGGESTIONS);

        let additional_advice = self
            .additional_advice
            .filter(|advice| !advice.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADVICE.to_string());

        HospitalSuggestionOutput {
            suggestions,
            additional_advice,
        }
    }
}

pub fn output_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "suggestions": {
                "type": "array",
                "description": "An array of up to 3 medical service or specialty suggestions.",
                "items": {
                    "type": "object",
                    "properties": {
                        "serviceOrSpecialty": {"type": "string"},
                        "reason": {"type": "string"},
                        "suggestedDoctorName": {"type": "string"},
                        "relevantHospitalName": {"type": "string"}
                    },
                    "required": ["serviceOrSpecialty", "reason"]
                }
            },
            "additionalAdvice": {"type": "string"}
        },
        "required": ["suggestions"]
    })
}

pub fn render_prompt(input: &HospitalSuggestionInput) -> GenerateRequest {
    let mut needs = format!("- Symptoms/Concerns: {}\n", input.symptoms_or_needs);
    if let Some(specialty) = input.preferred_specialty.as_deref().filter(|s| !s.is_empty()) {
        needs.push_str(&format!("- Preferred Specialty: {}\n", specialty));
    }
    if let Some(location) = input.location_preference.as_deref().filter(|s| !s.is_empty()) {
        needs.push_str(&format!("- Location Preference: {}\n", location));
    }

    let prompt = format!(
        "You are a helpful AI medical assistant. A user has described their health needs. \
Your goal is to provide helpful suggestions for hospital services, medical specialties, and potentially relevant doctors or hospitals.

User's Health Needs:
{needs}
Available Hospital Information (assume you have a broader knowledge base):
{directory}

Based on the user's input and your general medical knowledge, please provide up to {max} suggestions.
For each suggestion, specify the 'serviceOrSpecialty' and a 'reason' explaining how it addresses the user's needs.
If a specific doctor from the provided list seems highly relevant, include 'suggestedDoctorName'.
If a specific hospital from the provided list is particularly suitable for the service, include 'relevantHospitalName'.
Conclude with 'additionalAdvice', such as a reminder to consult a doctor for diagnosis or to check hospital availability.
If location is mentioned, try to factor it in if possible, but broad matches are okay.
If symptoms are vague, suggest general consultation or an emergency room if symptoms sound urgent.
",
        needs = needs,
        directory = hospital_directory_summary(),
        max = MAX_SUGGESTIONS,
    );

    GenerateRequest::text(prompt).with_schema(output_schema())
}
