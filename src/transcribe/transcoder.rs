use crate::audio::AudioFormat;
use crate::error::{AgentError, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{info, warn};

/// Resamples recordings to the rate/channel count the speech engine expects
/// by shelling out to ffmpeg.
pub struct Transcoder {
    ffmpeg_bin: PathBuf,
    target: AudioFormat,
}

impl Transcoder {
    pub fn new(ffmpeg_bin: impl Into<PathBuf>, target: AudioFormat) -> Self {
        Self {
            ffmpeg_bin: ffmpeg_bin.into(),
            target,
        }
    }

    /// Resample `input` into `output` at the target format.
    ///
    /// When the input WAV already matches the target rate and channel count
    /// (verified by re-reading its header) the file is copied directly,
    /// skipping the process spawn.
    pub async fn resample(&self, input: &Path, output: &Path) -> Result<()> {
        if self.already_target_format(input) {
            info!(input = %input.display(), "audio already in target format, copying");
            tokio::fs::copy(input, output).await?;
            return Ok(());
        }

        let result = Command::new(&self.ffmpeg_bin)
            .arg("-i")
            .arg(input)
            .args(["-ar", &self.target.sample_rate.to_string()])
            .args(["-ac", &self.target.channels.to_string()])
            .arg(output)
            .arg("-y")
            .output()
            .await
            .map_err(|e| AgentError::TranscodeFailed(format!("failed to spawn ffmpeg: {e}")))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(AgentError::TranscodeFailed(format!(
                "ffmpeg exited with {}: {}",
                result.status,
                stderr.lines().last().unwrap_or_default()
            )));
        }

        info!(
            output = %output.display(),
            sample_rate = self.target.sample_rate,
            channels = self.target.channels,
            "audio resampled"
        );

        Ok(())
    }

    fn already_target_format(&self, input: &Path) -> bool {
        match hound::WavReader::open(input) {
            Ok(reader) => {
                let spec = reader.spec();
                spec.sample_rate == self.target.sample_rate
                    && spec.channels == self.target.channels
            }
            Err(e) => {
                warn!(input = %input.display(), "could not read WAV header: {e}");
                false
            }
        }
    }
}
