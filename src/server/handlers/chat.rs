use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::rag::Answer;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub course_id: String,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}

/// Send a message to the course-specific chatbot.
///
/// Malformed input is the only caller-visible error; any other failure is
/// converted into a diagnostic answer so the endpoint always responds with
/// the full contract shape.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.course_id.trim().is_empty() {
        return Err(ApiError::BadRequest("course_id is required".to_string()));
    }

    let message_preview: String = request.message.chars().take(50).collect();
    tracing::info!(
        "Chat request - course: {}, message: {}...",
        request.course_id,
        message_preview
    );

    match state
        .chatbot
        .answer(&request.course_id, &request.message, &request.history)
        .await
    {
        Ok(answer) => {
            tracing::info!("Chat response generated - sources: {}", answer.sources.len());
            Ok(Json(answer))
        }
        Err(ApiError::BadRequest(msg)) => Err(ApiError::BadRequest(msg)),
        Err(err) => {
            tracing::error!("Chat error for course {}: {}", request.course_id, err);
            Ok(Json(diagnostic_answer(&request.course_id)))
        }
    }
}

fn diagnostic_answer(course_id: &str) -> Answer {
    Answer {
        message: "I ran into an internal problem while answering, so this \
                  response comes without sources. Please try again in a \
                  moment, or rephrase your question."
            .to_string(),
        sources: Vec::new(),
        course_id: course_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_defaults_to_empty() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"course_id": "demo-101", "message": "What are pointers?"}"#,
        )
        .expect("request should parse without history");

        assert!(request.history.is_empty());
    }

    #[test]
    fn diagnostic_answer_keeps_the_contract_shape() {
        let answer = diagnostic_answer("demo-101");
        assert!(!answer.message.is_empty());
        assert!(answer.sources.is_empty());
        assert_eq!(answer.course_id, "demo-101");
    }
}
