//! HTTP status surface
//!
//! A small read-only API next to the NATS transport:
//! - GET /health - health check
//! - GET /clients/:client_id/history - stored conversation history

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
