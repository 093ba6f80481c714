//! External-process adapters for audio preparation and recognition
//!
//! Both adapters spawn one process per invocation and never retry; retry
//! policy belongs to the caller. They run on the tokio blocking-friendly
//! process API so a long transcription never stalls other clients' tasks.

mod transcoder;
mod whisper;

pub use transcoder::Transcoder;
pub use whisper::{parse_recognizer_output, SpeechToText};

use crate::error::Result;
use std::path::Path;

/// Speech recognition seam. Production uses [`SpeechToText`]; tests
/// substitute scripted implementations.
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe a 16kHz mono WAV file into text.
    ///
    /// `EmptyTranscript` means the recognizer ran but heard nothing usable;
    /// callers treat that as a retry prompt, not a failure.
    async fn transcribe(&self, audio: &Path) -> Result<String>;
}
