// Integration tests for the per-client session store
//
// These tests verify the recording state machine: lazy session creation,
// format latching, at-most-once finalize, and isolation between clients.

use voice_agent::audio::{build_frame, AudioFormat};
use voice_agent::session::{FinalizeOutcome, SessionStore};

fn mono_16k() -> AudioFormat {
    AudioFormat {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
    }
}

fn frame(pcm: &[u8]) -> Vec<u8> {
    build_frame(pcm, &mono_16k())
}

#[tokio::test]
async fn test_ingest_then_finalize_returns_concatenated_pcm() {
    let store = SessionStore::new();

    let first = store
        .ingest_frame("client-a", &frame(&[1, 2, 3]))
        .await
        .expect("valid frame");
    assert!(first.started);
    assert_eq!(first.format, mono_16k());

    let second = store
        .ingest_frame("client-a", &frame(&[4, 5]))
        .await
        .expect("valid frame");
    assert!(!second.started);

    match store.finalize("client-a").await {
        FinalizeOutcome::Finalized { pcm, format } => {
            assert_eq!(pcm, vec![1, 2, 3, 4, 5]);
            assert_eq!(format, mono_16k());
        }
        FinalizeOutcome::Nothing => panic!("expected buffered audio"),
    }
}

#[tokio::test]
async fn test_finalize_is_at_most_once() {
    let store = SessionStore::new();
    store
        .ingest_frame("client-a", &frame(&[9, 9]))
        .await
        .expect("valid frame");

    assert!(matches!(
        store.finalize("client-a").await,
        FinalizeOutcome::Finalized { .. }
    ));

    // Second finalize without new frames yields nothing, not stale data.
    assert!(matches!(
        store.finalize("client-a").await,
        FinalizeOutcome::Nothing
    ));
}

#[tokio::test]
async fn test_finalize_without_recording_is_nothing() {
    let store = SessionStore::new();
    assert!(matches!(
        store.finalize("never-seen").await,
        FinalizeOutcome::Nothing
    ));
}

#[tokio::test]
async fn test_malformed_frame_leaves_session_unchanged() {
    let store = SessionStore::new();
    store
        .ingest_frame("client-a", &frame(&[1, 2]))
        .await
        .expect("valid frame");

    // 19 bytes of garbage: rejected without touching the buffer.
    let garbage = vec![0x5A; 19];
    assert!(store.ingest_frame("client-a", &garbage).await.is_err());

    match store.finalize("client-a").await {
        FinalizeOutcome::Finalized { pcm, .. } => assert_eq!(pcm, vec![1, 2]),
        FinalizeOutcome::Nothing => panic!("valid frame should still be buffered"),
    }
}

#[tokio::test]
async fn test_malformed_frame_does_not_start_recording() {
    let store = SessionStore::new();
    assert!(store.ingest_frame("client-a", &[0u8; 19]).await.is_err());
    assert!(matches!(
        store.finalize("client-a").await,
        FinalizeOutcome::Nothing
    ));
}

#[tokio::test]
async fn test_format_latches_on_first_frame() {
    let store = SessionStore::new();
    store
        .ingest_frame("client-a", &frame(&[1]))
        .await
        .expect("valid frame");

    // A frame claiming a different rate does not change the latched format.
    let other = AudioFormat {
        channels: 2,
        sample_rate: 48000,
        bits_per_sample: 16,
    };
    let outcome = store
        .ingest_frame("client-a", &build_frame(&[2], &other))
        .await
        .expect("valid frame");
    assert_eq!(outcome.format, mono_16k());

    match store.finalize("client-a").await {
        FinalizeOutcome::Finalized { format, .. } => assert_eq!(format, mono_16k()),
        FinalizeOutcome::Nothing => panic!("expected buffered audio"),
    }
}

#[tokio::test]
async fn test_clients_are_independent() {
    let store = SessionStore::new();
    store
        .ingest_frame("client-a", &frame(&[1]))
        .await
        .expect("valid frame");
    store
        .ingest_frame("client-b", &frame(&[2]))
        .await
        .expect("valid frame");

    match store.finalize("client-a").await {
        FinalizeOutcome::Finalized { pcm, .. } => assert_eq!(pcm, vec![1]),
        FinalizeOutcome::Nothing => panic!("client-a should have audio"),
    }

    // Finalizing client-a must not disturb client-b.
    match store.finalize("client-b").await {
        FinalizeOutcome::Finalized { pcm, .. } => assert_eq!(pcm, vec![2]),
        FinalizeOutcome::Nothing => panic!("client-b should have audio"),
    }
}

#[tokio::test]
async fn test_new_recording_after_finalize_relatches_format() {
    let store = SessionStore::new();
    store
        .ingest_frame("client-a", &frame(&[1]))
        .await
        .expect("valid frame");
    store.finalize("client-a").await;

    let stereo = AudioFormat {
        channels: 2,
        sample_rate: 44100,
        bits_per_sample: 16,
    };
    let outcome = store
        .ingest_frame("client-a", &build_frame(&[2, 3], &stereo))
        .await
        .expect("valid frame");
    assert!(outcome.started);
    assert_eq!(outcome.format, stereo);
}
