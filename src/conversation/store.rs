use crate::error::{AgentError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One entry in a client's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Per-client message history with system-prompt injection.
///
/// The store exclusively owns history; callers only ever receive clones.
pub struct ConversationStore {
    system_prompt: String,
    max_history_pairs: usize,
    histories: RwLock<HashMap<String, Vec<Message>>>,
}

impl ConversationStore {
    pub fn new(system_prompt: impl Into<String>, max_history_pairs: usize) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            max_history_pairs,
            histories: RwLock::new(HashMap::new()),
        }
    }

    pub async fn append_user(&self, client_id: &str, text: impl Into<String>) -> Message {
        self.append(client_id, Message::new(Role::User, text), true)
            .await
    }

    pub async fn append_assistant(&self, client_id: &str, text: impl Into<String>) -> Message {
        self.append(client_id, Message::new(Role::Assistant, text), true)
            .await
    }

    /// Append a tool result mid-turn. Tool messages do not trigger the trim
    /// check; the cap is re-applied when the turn's assistant message lands.
    pub async fn append_tool(&self, client_id: &str, text: impl Into<String>) -> Message {
        self.append(client_id, Message::new(Role::Tool, text), false)
            .await
    }

    async fn append(&self, client_id: &str, message: Message, trim: bool) -> Message {
        let mut histories = self.histories.write().await;
        let history = histories.entry(client_id.to_string()).or_default();
        history.push(message.clone());
        if trim {
            Self::trim(history, self.max_history_pairs);
        }
        message
    }

    /// Evict the oldest turns until the cap holds. Only user and assistant
    /// messages count toward the cap; tool messages ride along with their
    /// turn and are evicted with it. A turn spans the oldest user message
    /// through the assistant message that answered it.
    fn trim(history: &mut Vec<Message>, max_pairs: usize) {
        let cap = max_pairs * 2;
        loop {
            let counted = history.iter().filter(|m| m.role != Role::Tool).count();
            if counted <= cap {
                break;
            }
            let end = history
                .iter()
                .position(|m| m.role == Role::Assistant)
                .unwrap_or(0);
            history.drain(..=end);
        }
    }

    /// Build the request context: synthetic system message followed by the
    /// client's history. Never mutates stored history.
    pub async fn build_context(&self, client_id: &str) -> Vec<Message> {
        let histories = self.histories.read().await;
        let history = histories.get(client_id).map(Vec::as_slice).unwrap_or(&[]);

        let mut context = Vec::with_capacity(history.len() + 1);
        context.push(Message::new(Role::System, self.system_prompt.clone()));
        context.extend_from_slice(history);
        context
    }

    /// Snapshot of a client's stored history.
    pub async fn history(&self, client_id: &str) -> Vec<Message> {
        let histories = self.histories.read().await;
        histories.get(client_id).cloned().unwrap_or_default()
    }

    pub async fn clear(&self, client_id: &str) {
        let mut histories = self.histories.write().await;
        histories.remove(client_id);
        info!(client_id, "conversation history cleared");
    }

    /// Remove the matched message and every message after it, letting a user
    /// retract a turn along with everything that followed.
    pub async fn delete_from(&self, client_id: &str, message_id: &str) -> Result<()> {
        let mut histories = self.histories.write().await;
        let history = histories
            .get_mut(client_id)
            .ok_or_else(|| AgentError::HistoryNotFound(message_id.to_string()))?;

        let index = history
            .iter()
            .position(|m| m.id == message_id)
            .ok_or_else(|| AgentError::HistoryNotFound(message_id.to_string()))?;

        history.truncate(index);
        info!(client_id, message_id, "history truncated");
        Ok(())
    }
}
