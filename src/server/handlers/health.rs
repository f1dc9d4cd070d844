use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "name": format!("{} API", state.settings.app_name),
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "services": {
            "rag_chatbot": "available"
        }
    }))
}
