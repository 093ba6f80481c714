//! Dispatcher interface toward the transport collaborator
//!
//! The assistant core emits status, token, message and error events keyed by
//! client id; what carries them to an actual client is the transport's
//! concern. Implementations log their own delivery failures: a dropped event
//! must never abort a turn.

use crate::conversation::Message;
use serde::{Deserialize, Serialize};

/// Wire shape of one outbound event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub client_id: String,
    pub kind: EventKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Status,
    Token,
    Message,
    Error,
}

impl EventMessage {
    pub fn new(client_id: &str, kind: EventKind) -> Self {
        Self {
            client_id: client_id.to_string(),
            kind,
            message_id: None,
            message: None,
            text: None,
            detail: None,
            timestamp: chrono::Utc::now(),
        }
    }
}

/// Event sink toward the transport. Token delivery preserves per-client
/// ordering; there is no ordering requirement across clients.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    /// Human-readable progress string, one per pipeline stage.
    async fn send_status(&self, client_id: &str, status: &str);

    /// One streamed token for the message established at turn start.
    async fn send_token(&self, client_id: &str, message_id: &str, token: &str);

    /// A complete conversation message. `message_id` is the turn's envelope
    /// id, which for assistant drafts is established before any tokens flow.
    async fn send_message(&self, client_id: &str, message_id: &str, message: &Message);

    /// A turn-level failure, converted from the error taxonomy.
    async fn send_error(&self, client_id: &str, message: &str, detail: Option<String>);
}
