//! Per-client recording sessions
//!
//! Each connected client owns one `RecordingSession` that accumulates PCM
//! chunks between turn boundaries. Sessions are created lazily on the first
//! valid frame and torn down on finalize. Access is serialized per client id
//! while different clients proceed fully concurrently.

mod store;

pub use store::{FinalizeOutcome, IngestOutcome, SessionStore};
