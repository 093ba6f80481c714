use super::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};

/// GET /clients/:client_id/history
/// Stored conversation history for a client (empty when unknown)
pub async fn get_client_history(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
) -> impl IntoResponse {
    let history = state.assistant.history(&client_id).await;
    (StatusCode::OK, Json(history))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
