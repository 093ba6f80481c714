use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(
            "/clients/:client_id/history",
            get(handlers::get_client_history),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
