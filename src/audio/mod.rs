//! WAV framing for the transport boundary
//!
//! Clients deliver each audio chunk as a self-contained WAV frame. This module
//! parses those frames into raw PCM plus a detected format, and rebuilds WAV
//! files for the external resampler/recognizer. Pure byte handling, no I/O
//! except [`wav::write_wav_file`].

pub mod wav;

pub use wav::{build_frame, parse_frame, write_wav_file, AudioFormat, HEADER_LEN};
