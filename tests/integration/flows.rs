use crate::common::{test_app, ScriptedBackend};
use aramiyot::flows::{
    hospital::{DEFAULT_ADVICE, NO_OUTPUT_ADVICE},
    Flows, HospitalSuggestionInput, RecommendationInput,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn knee_pain() -> HospitalSuggestionInput {
    HospitalSuggestionInput {
        symptoms_or_needs: "knee pain".to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_knee_pain_without_output_returns_fallback() {
    let flows = Flows::new(Arc::new(ScriptedBackend::structured(None)));

    let output = flows.run_hospital_suggestion_flow(knee_pain()).await.unwrap();

    assert!(output.suggestions.is_empty());
    assert_eq!(output.additional_advice, NO_OUTPUT_ADVICE);
}

#[tokio::test]
async fn test_hospital_output_is_capped_and_disclaimed() {
    let suggestions: Vec<Value> = (0..5)
        .map(|i| {
            serde_json::json!({
                "serviceOrSpecialty": format!("Specialty {}", i),
                "reason": "Relevant to the symptoms"
            })
        })
        .collect();
    let json = serde_json::json!({ "suggestions": suggestions, "additionalAdvice": "" }).to_string();
    let flows = Flows::new(Arc::new(ScriptedBackend::structured(Some(&json))));

    let output = flows.run_hospital_suggestion_flow(knee_pain()).await.unwrap();

    assert_eq!(output.suggestions.len(), 3);
    assert_eq!(output.suggestions[0].service_or_specialty, "Specialty 0");
    assert_eq!(output.additional_advice, DEFAULT_ADVICE);
}

#[tokio::test]
async fn test_hospital_prompt_includes_directory_and_preferences() {
    let backend = Arc::new(ScriptedBackend::structured(None));
    let flows = Flows::new(backend.clone());

    flows
        .run_hospital_suggestion_flow(HospitalSuggestionInput {
            symptoms_or_needs: "chest pain".to_string(),
            preferred_specialty: Some("Cardiology".to_string()),
            location_preference: None,
        })
        .await
        .unwrap();

    let prompt = &backend.prompts()[0];
    assert!(prompt.contains("chest pain"));
    assert!(prompt.contains("Cardiology"));
}

#[tokio::test]
async fn test_recommendation_cards_over_http() {
    let json = r#"{"recommendations": ["Try a 10-minute morning stretch", "Swap soda for sparkling water", "Walk after dinner", "Journal before bed"]}"#;
    let backend = Arc::new(ScriptedBackend::structured(Some(json)));
    let app = test_app(backend.clone()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/recommendations/cards")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"query": "yoga"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let cards: Vec<Value> = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(cards.len(), 3);
    assert_eq!(cards[0]["title"], "Try a 10-minute morning stretch");
    assert_eq!(cards[0]["category"], "Personalized");
    assert!(backend.prompts()[0].contains("yoga"));
}

#[tokio::test]
async fn test_recommendation_flow_uses_default_activity() {
    let backend = Arc::new(ScriptedBackend::structured(Some(
        r#"{"recommendations": ["Breathe"]}"#,
    )));
    let flows = Flows::new(backend.clone());

    let output = flows
        .run_recommendation_flow(RecommendationInput::for_query(None))
        .await
        .unwrap();

    assert_eq!(output.recommendations, vec!["Breathe".to_string()]);
    assert!(backend.prompts()[0].contains("mindfulness"));
}
