use crate::llm::{tool_call_from_value, ToolCall};
use std::ops::Range;

/// Remove the first embedded `{... "tool_calls": [...] ...}` JSON object
/// from `text`, preserving every other character in order.
///
/// Only a balanced, parseable JSON object whose `tool_calls` field is an
/// array is stripped; prose that merely mentions "tool_calls" passes through
/// unchanged.
pub fn strip_tool_call_json(text: &str) -> String {
    match find_tool_call_block(text) {
        Some((range, _)) => {
            let mut cleaned = String::with_capacity(text.len() - range.len());
            cleaned.push_str(&text[..range.start]);
            cleaned.push_str(&text[range.end..]);
            cleaned
        }
        None => text.to_string(),
    }
}

/// Best-effort scan of an accumulated draft for an embedded tool-call block.
/// Used when the backend never sent a structured `tool_calls` field.
///
/// A block whose `tool_calls` array is empty (or holds no parseable entries)
/// counts as no calls, so a stray empty array never aborts a turn.
pub fn scan_tool_calls(text: &str) -> Option<Vec<ToolCall>> {
    let (_, calls) = find_tool_call_block(text)?;
    if calls.is_empty() {
        None
    } else {
        Some(calls)
    }
}

/// Locate the first balanced-brace JSON object carrying a `tool_calls`
/// array, returning its byte range and the parsed calls.
///
/// Brace matching is depth-counted rather than regex-greedy so nested
/// objects inside the block do not cut it short.
fn find_tool_call_block(text: &str) -> Option<(Range<usize>, Vec<ToolCall>)> {
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }

        match balanced_block_end(bytes, i) {
            Some(end) => {
                let block = &text[i..end];
                if let Some(calls) = parse_tool_calls_block(block) {
                    return Some((i..end, calls));
                }
                // Not a tool-call block; keep scanning past this object so
                // a later block can still match.
                i = end;
            }
            None => {
                // Unbalanced from here to end of text; no block can start
                // at or after this brace.
                return None;
            }
        }
    }

    None
}

/// Find the end (exclusive) of the brace-balanced region starting at `start`.
fn balanced_block_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_tool_calls_block(block: &str) -> Option<Vec<ToolCall>> {
    let value: serde_json::Value = serde_json::from_str(block).ok()?;
    let calls = value.get("tool_calls")?.as_array()?;
    Some(calls.iter().filter_map(tool_call_from_value).collect())
}
