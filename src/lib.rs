pub mod assistant;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod llm;
pub mod nats;
pub mod session;
pub mod tools;
pub mod transcribe;

pub use assistant::{Assistant, AssistantConfig, MAX_TOOL_ITERATIONS};
pub use audio::{build_frame, parse_frame, AudioFormat};
pub use config::Config;
pub use conversation::{ConversationStore, Message, Role};
pub use dispatch::{Dispatcher, EventKind, EventMessage};
pub use error::AgentError;
pub use http::{create_router, AppState};
pub use llm::{
    classify_stream_line, ChatBackend, ChatEvent, NdjsonParser, OllamaClient, ToolCall,
    ToolResult, ToolSpec,
};
pub use nats::{AudioFrameMessage, ControlAction, ControlMessage, NatsDispatcher, NatsTransport};
pub use session::{FinalizeOutcome, SessionStore};
pub use tools::{scan_tool_calls, strip_tool_call_json, ToolRegistry};
pub use transcribe::{parse_recognizer_output, SpeechRecognizer, SpeechToText, Transcoder};
