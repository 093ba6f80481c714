//! Voice assistant orchestrator
//!
//! Coordinates the whole pipeline for each client turn: buffered audio is
//! framed and finalized, resampled and transcribed by the external adapters,
//! appended to conversation history, and answered through the streaming
//! tool-calling loop in [`turn`]. Every per-turn error is caught here and
//! converted into a single dispatcher error event; failures never cross
//! client boundaries and never kill a client task.

mod turn;

use crate::audio::{self, AudioFormat};
use crate::config::Config;
use crate::conversation::{ConversationStore, Message};
use crate::dispatch::Dispatcher;
use crate::error::{AgentError, Result};
use crate::llm::ChatBackend;
use crate::session::{FinalizeOutcome, SessionStore};
use crate::tools::ToolRegistry;
use crate::transcribe::{SpeechRecognizer, SpeechToText, Transcoder};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

/// Upper bound on tool-loop rounds within one turn.
pub const MAX_TOOL_ITERATIONS: usize = 5;

/// Construction-time settings for the orchestrator, decoupled from the file
/// config so tests can build instances directly.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Model label used in progress messages.
    pub model_label: String,
    pub system_prompt: String,
    pub max_history_pairs: usize,
    /// Directory for intermediate recording files.
    pub temp_dir: PathBuf,
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
    pub whisper_model: String,
    pub whisper_threads: u32,
}

impl AssistantConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model_label: config.llm.model.clone(),
            system_prompt: config.llm.system_prompt.clone(),
            max_history_pairs: config.llm.max_history_pairs,
            temp_dir: PathBuf::from(&config.audio.temp_path),
            ffmpeg_bin: config.audio.ffmpeg_bin.clone(),
            whisper_bin: config.speech.whisper_bin.clone(),
            whisper_model: config.speech.model_path.clone(),
            whisper_threads: config.speech.threads,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model_label: "gemma3:1b".to_string(),
            system_prompt: "You are a desk-side support assistant.".to_string(),
            max_history_pairs: 10,
            temp_dir: std::env::temp_dir().join("voice-agent"),
            ffmpeg_bin: "ffmpeg".to_string(),
            whisper_bin: "whisper-cli".to_string(),
            whisper_model: "ggml-base.en.bin".to_string(),
            whisper_threads: 4,
        }
    }
}

/// The per-process assistant instance. Explicitly constructed and
/// dependency-injected; multiple independent instances can coexist (tests
/// rely on this).
pub struct Assistant {
    config: AssistantConfig,
    sessions: SessionStore,
    conversations: ConversationStore,
    transcoder: Transcoder,
    speech: Arc<dyn SpeechRecognizer>,
    chat: Arc<dyn ChatBackend>,
    tools: ToolRegistry,
    dispatcher: Arc<dyn Dispatcher>,
    /// Per-client cancellation flags for in-flight turns.
    turns: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl Assistant {
    pub fn new(
        config: AssistantConfig,
        chat: Arc<dyn ChatBackend>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        let speech = Arc::new(SpeechToText::new(
            &config.whisper_bin,
            &config.whisper_model,
            config.whisper_threads,
        ));
        Self::with_recognizer(config, chat, dispatcher, speech)
    }

    /// Construct with an explicit speech recognizer instead of the default
    /// whisper-cli adapter.
    pub fn with_recognizer(
        config: AssistantConfig,
        chat: Arc<dyn ChatBackend>,
        dispatcher: Arc<dyn Dispatcher>,
        speech: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        let conversations =
            ConversationStore::new(config.system_prompt.clone(), config.max_history_pairs);
        let transcoder = Transcoder::new(&config.ffmpeg_bin, AudioFormat::whisper_target());

        Self {
            config,
            sessions: SessionStore::new(),
            conversations,
            transcoder,
            speech,
            chat,
            tools: ToolRegistry::new(),
            dispatcher,
            turns: Mutex::new(HashMap::new()),
        }
    }

    /// Ingest one binary audio frame from the transport.
    pub async fn handle_frame(&self, client_id: &str, bytes: &[u8]) {
        match self.sessions.ingest_frame(client_id, bytes).await {
            Ok(outcome) => {
                if outcome.started {
                    self.dispatcher
                        .send_status(
                            client_id,
                            &format!(
                                "Started recording audio ({} channels, {}Hz)...",
                                outcome.format.channels, outcome.format.sample_rate
                            ),
                        )
                        .await;
                }
            }
            Err(e) => {
                warn!(client_id, "rejected audio frame: {e}");
                self.dispatcher
                    .send_error(client_id, "Received invalid audio chunk", Some(e.to_string()))
                    .await;
            }
        }
    }

    /// End-of-turn signal: finalize the recording and run the full
    /// transcribe-and-respond pipeline.
    pub async fn end_turn(&self, client_id: &str) {
        let (pcm, format) = match self.sessions.finalize(client_id).await {
            FinalizeOutcome::Nothing => {
                self.dispatcher
                    .send_status(client_id, "No active recording to end.")
                    .await;
                return;
            }
            FinalizeOutcome::Finalized { pcm, format } => (pcm, format),
        };

        if let Err(e) = self.process_recording(client_id, pcm, format).await {
            self.report_error(client_id, &e).await;
        }
    }

    async fn process_recording(
        &self,
        client_id: &str,
        pcm: Vec<u8>,
        format: AudioFormat,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        let stamp = chrono::Utc::now().timestamp_millis();
        let raw_path = self.config.temp_dir.join(format!("recording_{stamp}.wav"));
        let resampled_path = self
            .config
            .temp_dir
            .join(format!("recording_{stamp}_16k.wav"));

        audio::write_wav_file(&raw_path, &pcm, &format)?;

        self.dispatcher
            .send_status(
                client_id,
                &format!(
                    "Processing your request... ({} channels, {}Hz -> 16kHz)",
                    format.channels, format.sample_rate
                ),
            )
            .await;

        let result = self.transcribe_recording(client_id, &raw_path, &resampled_path).await;

        // The core owns the temp files from handoff onward; drop them no
        // matter how the pipeline went.
        for path in [&raw_path, &resampled_path] {
            if let Err(e) = tokio::fs::remove_file(path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %path.display(), "failed to clean up temp file: {e}");
                }
            }
        }

        let transcript = match result {
            Ok(transcript) => transcript,
            Err(AgentError::EmptyTranscript) => {
                info!(client_id, "empty transcript");
                self.dispatcher
                    .send_status(
                        client_id,
                        "I couldn't understand what you said. Please try again.",
                    )
                    .await;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        self.dispatcher
            .send_status(client_id, "Generating response...")
            .await;
        self.handle_transcript(client_id, &transcript).await;
        Ok(())
    }

    async fn transcribe_recording(
        &self,
        client_id: &str,
        raw_path: &std::path::Path,
        resampled_path: &std::path::Path,
    ) -> Result<String> {
        self.transcoder.resample(raw_path, resampled_path).await?;

        self.dispatcher.send_status(client_id, "Transcribing...").await;
        self.speech.transcribe(resampled_path).await
    }

    /// Run the conversation turn for an already-transcribed utterance.
    /// Public so callers past the speech boundary (and tests) can enter the
    /// loop directly.
    pub async fn handle_transcript(&self, client_id: &str, transcript: &str) {
        if transcript.trim().is_empty() {
            self.dispatcher
                .send_error(client_id, "No valid transcript provided.", None)
                .await;
            return;
        }

        let cancel = self.begin_turn(client_id).await;
        let outcome = self.run_turn(client_id, transcript, &cancel).await;
        self.finish_turn(client_id).await;

        if let Err(e) = outcome {
            self.report_error(client_id, &e).await;
        }
    }

    /// Signal that a client disconnected: any in-flight turn stops at its
    /// next iteration boundary and its results are discarded.
    pub async fn cancel(&self, client_id: &str) {
        let turns = self.turns.lock().await;
        if let Some(flag) = turns.get(client_id) {
            info!(client_id, "cancelling in-flight turn");
            flag.store(true, Ordering::SeqCst);
        }
        drop(turns);
        self.sessions.remove(client_id).await;
    }

    pub async fn clear_history(&self, client_id: &str) {
        self.conversations.clear(client_id).await;
        self.dispatcher
            .send_status(client_id, "Conversation history cleared.")
            .await;
    }

    pub async fn delete_from(&self, client_id: &str, message_id: &str) {
        match self.conversations.delete_from(client_id, message_id).await {
            Ok(()) => {
                self.dispatcher
                    .send_status(
                        client_id,
                        &format!("Deleted message {message_id} and everything after it."),
                    )
                    .await;
            }
            Err(e) => self.report_error(client_id, &e).await,
        }
    }

    pub async fn history(&self, client_id: &str) -> Vec<Message> {
        self.conversations.history(client_id).await
    }

    /// The event sink this instance was built with.
    pub fn dispatcher(&self) -> &Arc<dyn Dispatcher> {
        &self.dispatcher
    }

    async fn begin_turn(&self, client_id: &str) -> Arc<AtomicBool> {
        let flag = Arc::new(AtomicBool::new(false));
        let mut turns = self.turns.lock().await;
        turns.insert(client_id.to_string(), Arc::clone(&flag));
        flag
    }

    async fn finish_turn(&self, client_id: &str) {
        let mut turns = self.turns.lock().await;
        turns.remove(client_id);
    }

    /// Convert a pipeline error into the single user-facing error event for
    /// this turn.
    async fn report_error(&self, client_id: &str, e: &AgentError) {
        error!(client_id, "turn failed: {e}");

        let message = match e {
            AgentError::MalformedFrame(_) => "Received invalid audio chunk",
            AgentError::EmptyTranscript => {
                "I couldn't understand what you said. Please try again."
            }
            AgentError::TranscodeFailed(_) | AgentError::TranscribeFailed(_) | AgentError::Io(_) => {
                "Sorry, I encountered an error processing your request."
            }
            AgentError::ServiceUnavailable(_) => {
                "I'm sorry, I'm having trouble connecting to my language model right now."
            }
            AgentError::ToolExecutionFailed(_) => "Tool execution failed.",
            AgentError::HistoryNotFound(_) => "Message not found in conversation history.",
        };

        self.dispatcher
            .send_error(client_id, message, Some(e.to_string()))
            .await;
    }
}
