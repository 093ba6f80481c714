// Integration tests for WAV framing
//
// These tests verify that frames built by the framer parse back to the same
// PCM and format, and that untrusted bytes can never crash the parser.

use voice_agent::audio::{build_frame, parse_frame, AudioFormat, HEADER_LEN};
use voice_agent::error::AgentError;

fn fmt(channels: u16, sample_rate: u32, bits_per_sample: u16) -> AudioFormat {
    AudioFormat {
        channels,
        sample_rate,
        bits_per_sample,
    }
}

#[test]
fn test_round_trip_preserves_pcm_and_format() {
    let formats = [fmt(1, 16000, 16), fmt(2, 44100, 16), fmt(2, 48000, 24)];

    for format in formats {
        let pcm: Vec<u8> = (0..=255).cycle().take(4096).map(|b| b as u8).collect();
        let frame = build_frame(&pcm, &format);

        let (parsed_pcm, parsed_format) = parse_frame(&frame).expect("frame should parse");
        assert_eq!(parsed_pcm, &pcm[..]);
        assert_eq!(parsed_format, format);
    }
}

#[test]
fn test_round_trip_single_byte_payload() {
    let format = fmt(1, 16000, 16);
    let frame = build_frame(&[0x7f], &format);

    let (pcm, parsed) = parse_frame(&frame).expect("frame should parse");
    assert_eq!(pcm, &[0x7f]);
    assert_eq!(parsed, format);
}

#[test]
fn test_header_layout() {
    let format = fmt(2, 44100, 16);
    let pcm = vec![0u8; 100];
    let frame = build_frame(&pcm, &format);

    assert_eq!(frame.len(), HEADER_LEN + 100);
    assert_eq!(&frame[0..4], b"RIFF");
    assert_eq!(&frame[8..12], b"WAVE");
    assert_eq!(&frame[12..16], b"fmt ");
    assert_eq!(&frame[36..40], b"data");

    // Chunk sizes at the documented offsets
    let riff_size = u32::from_le_bytes([frame[4], frame[5], frame[6], frame[7]]);
    assert_eq!(riff_size, 36 + 100);
    let data_size = u32::from_le_bytes([frame[40], frame[41], frame[42], frame[43]]);
    assert_eq!(data_size, 100);

    // Format fields at the documented offsets
    assert_eq!(u16::from_le_bytes([frame[22], frame[23]]), 2);
    assert_eq!(u32::from_le_bytes([frame[24], frame[25], frame[26], frame[27]]), 44100);
    assert_eq!(u16::from_le_bytes([frame[34], frame[35]]), 16);
}

#[test]
fn test_garbage_input_is_rejected() {
    let garbage = vec![0xAB; 19];
    let result = parse_frame(&garbage);
    assert!(matches!(result, Err(AgentError::MalformedFrame(_))));
}

#[test]
fn test_wrong_magic_is_rejected() {
    let format = fmt(1, 16000, 16);
    let mut frame = build_frame(&[0u8; 64], &format);
    frame[0..4].copy_from_slice(b"RIFX");
    assert!(matches!(
        parse_frame(&frame),
        Err(AgentError::MalformedFrame(_))
    ));

    let mut frame = build_frame(&[0u8; 64], &format);
    frame[8..12].copy_from_slice(b"EVAW");
    assert!(matches!(
        parse_frame(&frame),
        Err(AgentError::MalformedFrame(_))
    ));
}

#[test]
fn test_missing_data_tag_is_rejected() {
    let format = fmt(1, 16000, 16);
    let mut frame = build_frame(&[0u8; 64], &format);
    frame[36..40].copy_from_slice(b"atad");
    assert!(matches!(
        parse_frame(&frame),
        Err(AgentError::MalformedFrame(_))
    ));
}

#[test]
fn test_empty_input_is_rejected() {
    assert!(parse_frame(&[]).is_err());
}

#[test]
fn test_header_only_frame_yields_empty_pcm() {
    // A frame whose data chunk is empty is structurally valid.
    let format = fmt(1, 16000, 16);
    let frame = build_frame(&[], &format);

    let (pcm, parsed) = parse_frame(&frame).expect("header-only frame should parse");
    assert!(pcm.is_empty());
    assert_eq!(parsed, format);
}

#[test]
fn test_data_tag_after_extra_chunk_is_found() {
    // Encoders may insert extra chunks between fmt and data; the parser
    // scans for the tag rather than assuming offset 36.
    let format = fmt(1, 16000, 16);
    let pcm = [1u8, 2, 3, 4];
    let frame = build_frame(&pcm, &format);

    let mut padded = frame[..36].to_vec();
    padded.extend_from_slice(b"LIST");
    padded.extend_from_slice(&4u32.to_le_bytes());
    padded.extend_from_slice(b"info");
    padded.extend_from_slice(&frame[36..]);

    let (parsed_pcm, _) = parse_frame(&padded).expect("frame with extra chunk should parse");
    assert_eq!(parsed_pcm, &pcm[..]);
}
