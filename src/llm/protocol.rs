use crate::conversation::{Message, Role};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Chat-completion request body (`POST /api/chat`).
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub tools: Vec<ToolSpec>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.text.clone(),
        }
    }
}

/// Function tool description in the format the inference service expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: ToolParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameters {
    #[serde(rename = "type")]
    pub kind: String,
    pub properties: HashMap<String, ToolProperty>,
    pub required: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

/// A tool invocation requested by the model. Transient, scoped to one
/// tool-loop iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: HashMap<String, String>,
}

/// The outcome of executing one tool call.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub name: String,
    pub result: String,
}

/// One line of the NDJSON response stream.
#[derive(Debug, Deserialize)]
pub struct StreamLine {
    #[serde(default)]
    pub message: Option<StreamMessage>,
    #[serde(default)]
    pub done: bool,
}

#[derive(Debug, Deserialize)]
pub struct StreamMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<serde_json::Value>>,
}

/// Convert a `tool_calls` array entry into a [`ToolCall`].
///
/// Accepts both the structured `{ "function": { "name", "arguments" } }`
/// shape and the flattened `{ "name", "arguments" }` shape; argument values
/// that are not strings are serialized in place.
pub fn tool_call_from_value(value: &serde_json::Value) -> Option<ToolCall> {
    let inner = value.get("function").unwrap_or(value);
    let name = inner.get("name")?.as_str()?.to_string();

    let mut arguments = HashMap::new();
    if let Some(map) = inner.get("arguments").and_then(|a| a.as_object()) {
        for (key, val) in map {
            let text = match val.as_str() {
                Some(s) => s.to_string(),
                None => val.to_string(),
            };
            arguments.insert(key.clone(), text);
        }
    }

    Some(ToolCall { name, arguments })
}

/// Incremental NDJSON line splitter.
///
/// Feed it raw response chunks; it yields complete lines and buffers any
/// trailing partial line across reads, so a line split mid-byte-stream is
/// never dropped or misparsed.
#[derive(Debug, Default)]
pub struct NdjsonParser {
    buffer: Vec<u8>,
}

impl NdjsonParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push one network chunk, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line[..line.len() - 1]).into_owned();
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Drain whatever remains after the stream closes (a final line without
    /// a trailing newline).
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }
}
