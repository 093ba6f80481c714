use crate::error::{AgentError, Result};
use std::path::Path;

/// WAV header length: RIFF descriptor + fmt chunk.
pub const HEADER_LEN: usize = 44;

/// PCM format detected from the first valid frame of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// 16kHz mono, the format the speech engine expects.
    pub fn whisper_target() -> Self {
        Self {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 16,
        }
    }
}

/// Parse one WAV frame into its PCM payload and format.
///
/// This is the only boundary that receives untrusted bytes directly from the
/// transport, so every offset is bounds-checked and malformed input yields
/// `MalformedFrame`, never a panic.
pub fn parse_frame(bytes: &[u8]) -> Result<(&[u8], AudioFormat)> {
    if bytes.len() < HEADER_LEN {
        return Err(AgentError::MalformedFrame("shorter than WAV header"));
    }

    if &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(AgentError::MalformedFrame("missing RIFF/WAVE markers"));
    }

    let channels = u16::from_le_bytes([bytes[22], bytes[23]]);
    let sample_rate = u32::from_le_bytes([bytes[24], bytes[25], bytes[26], bytes[27]]);
    let bits_per_sample = u16::from_le_bytes([bytes[34], bytes[35]]);

    let format = AudioFormat {
        channels,
        sample_rate,
        bits_per_sample,
    };

    // The data chunk usually sits at offset 36, but some encoders insert
    // extra chunks first, so scan for the tag past the RIFF descriptor.
    let data_tag = bytes[12..]
        .windows(4)
        .position(|w| w == b"data")
        .map(|p| p + 12)
        .ok_or(AgentError::MalformedFrame("missing data chunk"))?;

    // PCM starts after the 4-byte tag and 4-byte chunk length.
    let pcm_start = data_tag + 8;
    if pcm_start > bytes.len() {
        return Err(AgentError::MalformedFrame("truncated data chunk"));
    }

    Ok((&bytes[pcm_start..], format))
}

/// Build a WAV frame: 44-byte header followed by the PCM payload.
///
/// Exact inverse of [`parse_frame`]: `parse_frame(&build_frame(pcm, fmt))`
/// returns the same PCM bytes and format.
pub fn build_frame(pcm: &[u8], format: &AudioFormat) -> Vec<u8> {
    let data_len = pcm.len() as u32;
    let byte_rate =
        format.sample_rate * u32::from(format.channels) * u32::from(format.bits_per_sample) / 8;
    let block_align = format.channels * format.bits_per_sample / 8;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes()); // fmt chunk size
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM sample format
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Write PCM data to disk as a WAV file.
pub fn write_wav_file(path: impl AsRef<Path>, pcm: &[u8], format: &AudioFormat) -> Result<()> {
    std::fs::write(path, build_frame(pcm, format))?;
    Ok(())
}
