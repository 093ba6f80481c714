//! Fixed tool registry and tool-call text handling
//!
//! The registry exposes three tools (`getTime`, `rememberFact`, `flipCoin`)
//! that exist to exercise the tool-calling loop. Some inference backends
//! interleave tool-call JSON directly into the token stream instead of
//! sending a structured field; the `text` helpers strip and scan for those
//! embedded blocks with balanced-brace matching.

mod registry;
mod text;

pub use registry::ToolRegistry;
pub use text::{scan_tool_calls, strip_tool_call_json};
