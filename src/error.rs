use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

/// Error taxonomy for the assistant pipeline.
///
/// Every per-turn failure is caught at the orchestrator boundary and converted
/// into a single dispatcher error event; none of these crash a client task.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Incoming bytes were not a valid WAV frame. The session is untouched.
    #[error("malformed audio frame: {0}")]
    MalformedFrame(&'static str),

    /// The recognizer produced no usable text. Not fatal: the user is asked
    /// to try again.
    #[error("no speech recognized in recording")]
    EmptyTranscript,

    /// ffmpeg failed to spawn or exited non-zero. The turn is aborted.
    #[error("audio resampling failed: {0}")]
    TranscodeFailed(String),

    /// whisper-cli failed to spawn or exited non-zero. The turn is aborted.
    #[error("transcription failed: {0}")]
    TranscribeFailed(String),

    /// The inference service could not be reached. The caller may attempt a
    /// one-time service bootstrap before giving up.
    #[error("inference service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Tool calls were detected but execution returned no results.
    #[error("tool execution failed: {0}")]
    ToolExecutionFailed(String),

    /// A history operation referenced a message id that does not exist.
    #[error("message {0} not found in history")]
    HistoryNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
