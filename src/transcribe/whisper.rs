use super::SpeechRecognizer;
use crate::error::{AgentError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};

/// Invokes the whisper-cli recognizer against a local model file.
pub struct SpeechToText {
    binary: PathBuf,
    model: PathBuf,
    threads: u32,
}

impl SpeechToText {
    pub fn new(binary: impl Into<PathBuf>, model: impl Into<PathBuf>, threads: u32) -> Self {
        Self {
            binary: binary.into(),
            model: model.into(),
            threads,
        }
    }
}

#[async_trait::async_trait]
impl SpeechRecognizer for SpeechToText {
    async fn transcribe(&self, audio: &Path) -> Result<String> {
        info!(audio = %audio.display(), "transcribing");

        let result = Command::new(&self.binary)
            .arg("-m")
            .arg(&self.model)
            .arg("-f")
            .arg(audio)
            .arg("--output-txt")
            .arg("--no-timestamps")
            .args(["--language", "en"])
            .args(["--threads", &self.threads.to_string()])
            .output()
            .await
            .map_err(|e| {
                AgentError::TranscribeFailed(format!("failed to spawn whisper-cli: {e}"))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AgentError::TranscribeFailed(format!(
                "whisper-cli exited with {}: {}",
                result.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        let stdout = String::from_utf8_lossy(&result.stdout);
        let transcript = parse_recognizer_output(&stdout)?;

        debug!(transcript, "transcription complete");
        Ok(transcript)
    }
}

/// Extract the transcript line from recognizer stdout.
///
/// whisper-cli interleaves engine banners and progress lines with the actual
/// transcription; keep the first line that is not a known diagnostic, strip
/// any leading `[.. --> ..]` time-range marker, and normalize whitespace.
pub fn parse_recognizer_output(stdout: &str) -> Result<String> {
    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_diagnostic_line(trimmed) {
            continue;
        }

        let cleaned = normalize_whitespace(strip_time_range(trimmed));
        if cleaned.is_empty() {
            continue;
        }
        return Ok(cleaned);
    }

    Err(AgentError::EmptyTranscript)
}

fn is_diagnostic_line(line: &str) -> bool {
    line.starts_with("whisper_")
        || line.contains("processing")
        || line.contains("model loaded")
        || line.contains("milliseconds")
}

/// Strip a leading `[HH:MM:SS.mmm --> HH:MM:SS.mmm]` marker if present.
fn strip_time_range(line: &str) -> &str {
    if !line.starts_with('[') {
        return line;
    }
    match line.find(']') {
        Some(close) if line[..close].contains("-->") => line[close + 1..].trim_start(),
        _ => line,
    }
}

fn normalize_whitespace(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}
