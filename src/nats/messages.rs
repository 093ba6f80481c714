use serde::{Deserialize, Serialize};

/// One WAV-framed audio chunk from a client front-end.
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub client_id: String,
    /// Base64-encoded WAV frame bytes.
    pub data: String,
    /// RFC3339 timestamp set by the sender.
    pub timestamp: String,
}

/// Turn-boundary and history signals from a client front-end.
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlMessage {
    pub client_id: String,
    #[serde(flatten)]
    pub action: ControlAction,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    /// Announced before the first audio frame; recording itself starts
    /// implicitly on that frame.
    Start,
    /// End of turn: finalize and answer.
    End,
    /// Drop the client's conversation history.
    Clear,
    /// Retract a message and everything after it.
    Delete { message_id: String },
    /// Replay the stored history as message events.
    FetchHistory,
    /// Client went away; discard in-flight work.
    Disconnect,
}
