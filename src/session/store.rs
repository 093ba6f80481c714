use crate::audio::{self, AudioFormat};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

/// Recording lifecycle for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Recording,
    Finalizing,
}

/// Accumulated audio for one client between turn boundaries.
///
/// `format` is latched from the first successfully parsed frame and never
/// changes for the rest of the session; chunks are only accepted while
/// recording.
struct RecordingSession {
    state: SessionState,
    pcm_chunks: Vec<Vec<u8>>,
    format: Option<AudioFormat>,
}

impl RecordingSession {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            pcm_chunks: Vec::new(),
            format: None,
        }
    }

    fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.pcm_chunks = Vec::new();
        self.format = None;
    }
}

/// Result of ingesting one audio frame.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// True when this frame transitioned the session from idle to recording.
    pub started: bool,
    /// Format in effect for the session after this frame.
    pub format: AudioFormat,
}

/// Result of finalizing a session.
pub enum FinalizeOutcome {
    /// No active recording, or the buffer was empty. Not an error.
    Nothing,
    /// The concatenated PCM and its format. The session has already been
    /// reset, so the same data can never be handed out twice.
    Finalized { pcm: Vec<u8>, format: AudioFormat },
}

/// In-memory store of recording sessions, keyed by client id.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<RecordingSession>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    async fn session(&self, client_id: &str) -> Arc<Mutex<RecordingSession>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(session) = sessions.get(client_id) {
                return Arc::clone(session);
            }
        }

        let mut sessions = self.sessions.write().await;
        Arc::clone(
            sessions
                .entry(client_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(RecordingSession::new()))),
        )
    }

    /// Ingest one WAV frame for a client.
    ///
    /// Malformed frames return `MalformedFrame` and leave the session
    /// untouched. The first valid frame latches the format and starts
    /// recording. Frames for the same client are applied in arrival order
    /// under the per-client lock.
    pub async fn ingest_frame(&self, client_id: &str, bytes: &[u8]) -> Result<IngestOutcome> {
        // Parse before touching any state so bad input has no effect.
        let (pcm, parsed_format) = audio::parse_frame(bytes)?;

        let session = self.session(client_id).await;
        let mut session = session.lock().await;

        let format = *session.format.get_or_insert(parsed_format);

        let started = session.state != SessionState::Recording;
        if started {
            session.state = SessionState::Recording;
            session.pcm_chunks.clear();
            info!(
                client_id,
                channels = format.channels,
                sample_rate = format.sample_rate,
                "recording started"
            );
        }

        session.pcm_chunks.push(pcm.to_vec());
        Ok(IngestOutcome { started, format })
    }

    /// Finalize a client's recording, handing the buffered audio to the
    /// caller exactly once.
    ///
    /// The session is reset to idle with its buffers released no matter what
    /// the caller does downstream, so a second finalize without new frames
    /// yields `Nothing`.
    pub async fn finalize(&self, client_id: &str) -> FinalizeOutcome {
        let session = self.session(client_id).await;
        let mut session = session.lock().await;

        if session.state != SessionState::Recording || session.pcm_chunks.is_empty() {
            debug!(client_id, "nothing to finalize");
            return FinalizeOutcome::Nothing;
        }

        session.state = SessionState::Finalizing;

        let format = match session.format {
            Some(format) => format,
            None => {
                // Unreachable in practice: chunks imply a latched format.
                session.reset();
                return FinalizeOutcome::Nothing;
            }
        };

        let chunks = std::mem::take(&mut session.pcm_chunks);
        session.reset();

        let total: usize = chunks.iter().map(Vec::len).sum();
        let mut pcm = Vec::with_capacity(total);
        for chunk in chunks {
            pcm.extend_from_slice(&chunk);
        }

        info!(client_id, bytes = pcm.len(), "recording finalized");
        FinalizeOutcome::Finalized { pcm, format }
    }

    /// Drop a client's session entirely (e.g. on disconnect).
    pub async fn remove(&self, client_id: &str) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(client_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
