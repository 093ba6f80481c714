//! Streaming chat-completion client for the local inference service
//!
//! The service speaks NDJSON over HTTP: one JSON object per line, where each
//! line carries either a content token or a structured tool-call payload.
//! Network reads may split a line across chunks, so the parser buffers any
//! trailing partial line between reads.

mod client;
mod protocol;

pub use client::OllamaClient;
pub use protocol::{
    tool_call_from_value, ChatMessage, ChatRequest, NdjsonParser, StreamLine, StreamMessage,
    ToolCall, ToolFunction, ToolParameters, ToolProperty, ToolResult, ToolSpec,
};

use crate::conversation::Message;
use crate::error::Result;
use tokio::sync::mpsc;

/// One event from a streaming chat response.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A textual content token.
    Token(String),
    /// A structured tool-call payload. Lines carrying tool calls are never
    /// also treated as tokens.
    ToolCalls(Vec<ToolCall>),
}

/// Classify one NDJSON line of the response stream.
///
/// Returns `None` for malformed lines (protocol tolerance: one bad line must
/// not abort an otherwise-good stream) and for lines carrying neither content
/// nor tool calls, e.g. the final `done` marker. A line with a `tool_calls`
/// field is never also treated as a token.
pub fn classify_stream_line(line: &str) -> Option<ChatEvent> {
    let parsed: StreamLine = match serde_json::from_str(line) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::debug!("skipping malformed stream line: {e}");
            return None;
        }
    };

    let message = parsed.message?;

    if let Some(raw_calls) = message.tool_calls {
        let calls: Vec<_> = raw_calls
            .iter()
            .filter_map(protocol::tool_call_from_value)
            .collect();
        if calls.is_empty() {
            return None;
        }
        return Some(ChatEvent::ToolCalls(calls));
    }

    match message.content {
        Some(content) if !content.is_empty() => Some(ChatEvent::Token(content)),
        _ => None,
    }
}

/// Streaming chat backend. Production uses [`OllamaClient`]; tests substitute
/// scripted implementations.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    /// Stream a chat completion for `context`, delivering events in order on
    /// `events`. Returns once the stream closes.
    async fn stream_chat(
        &self,
        context: &[Message],
        tools: &[ToolSpec],
        events: mpsc::Sender<ChatEvent>,
    ) -> Result<()>;

    /// Attempt to start the backing service after a `ServiceUnavailable`.
    /// Returns true when the service became reachable. The attempt itself is
    /// time-bounded.
    async fn bootstrap(&self) -> bool {
        false
    }
}
