//! Tagged tool-call protocol embedded in message text
//!
//! The model emits `<tool_call>{"arguments": {...}, "name": "..."}</tool_call>`
//! inside its reply, and tool results go back as
//! `<tool_response>...</tool_response>`. All tag handling lives here.

use crate::state_machine::state::{Message, Role};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;

pub const TOOL_CALL_OPEN: &str = "<tool_call>";
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";
pub const TOOL_RESPONSE_OPEN: &str = "<tool_response>";
pub const TOOL_RESPONSE_CLOSE: &str = "</tool_response>";

static TOOL_CALL_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}(.*?){}",
        regex::escape(TOOL_CALL_OPEN),
        regex::escape(TOOL_CALL_CLOSE)
    ))
    .expect("tool-call pattern is valid")
});

static TOOL_RESPONSE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        "(?s){}.*?{}",
        regex::escape(TOOL_RESPONSE_OPEN),
        regex::escape(TOOL_RESPONSE_CLOSE)
    ))
    .expect("tool-response pattern is valid")
});

/// Return the trimmed payload of the first `<tool_call>` block in an
/// assistant message.
///
/// `None` for non-assistant messages, missing or unterminated tags, and
/// blocks with nothing inside. The payload is not validated as JSON here.
pub fn extract(message: &Message) -> Option<String> {
    if message.role != Role::Assistant {
        return None;
    }

    let captures = TOOL_CALL_BLOCK.captures(&message.content)?;
    let payload = captures.get(1)?.as_str().trim();
    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

/// Whether an assistant message carries a complete `<tool_call>` block,
/// empty or not
pub fn has_tool_call_block(message: &Message) -> bool {
    message.role == Role::Assistant && TOOL_CALL_BLOCK.is_match(&message.content)
}

/// Wrap a dispatch output in the tool-result envelope
pub fn wrap_tool_response(output: &str) -> String {
    format!("{TOOL_RESPONSE_OPEN}{output}{TOOL_RESPONSE_CLOSE}")
}

/// Whether text carries a complete `<tool_response>` envelope
pub fn is_tool_response(text: &str) -> bool {
    TOOL_RESPONSE_BLOCK.is_match(text)
}

/// A parsed tool invocation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Parse an extracted payload. Argument order is preserved.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

#[cfg(test)]
mod proptests;
