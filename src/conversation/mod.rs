//! Per-client conversation history
//!
//! Ordered message history with a trimming invariant: at most
//! `2 * max_history_pairs` messages are retained, with the oldest
//! user-through-assistant turn evicted when the cap is exceeded. The system
//! prompt is never stored; it is prepended synthetically when building a
//! request context.

mod store;

pub use store::{ConversationStore, Message, Role};
