use crate::assistant::Assistant;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Arc<Assistant>) -> Self {
        Self { assistant }
    }
}
