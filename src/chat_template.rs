//! ChatML prompt rendering
//!
//! The inference backend takes a single prompt string, so the transcript is
//! serialized here. Output must be byte-identical for identical input.

use crate::state_machine::state::Message;
use std::fmt::Write;

/// Beginning-of-sequence token
pub const BOS_TOKEN: &str = "<s>";
/// Opens a role segment
pub const IM_START: &str = "<|im_start|>";
/// Closes a role segment
pub const IM_END: &str = "<|im_end|>";

/// Render messages in input order, followed by an open assistant segment.
pub fn render(messages: &[Message]) -> String {
    let mut prompt = String::from(BOS_TOKEN);
    for message in messages {
        let _ = writeln!(
            prompt,
            "{IM_START}{}\n{}{IM_END}",
            message.role, message.content
        );
    }
    prompt.push_str(IM_START);
    prompt.push_str("assistant\n");
    prompt
}

/// Stop sequences matching the role delimiters, so the model cannot write
/// further turns on its own.
pub fn stop_sequences() -> Vec<String> {
    vec![IM_END.to_string(), IM_START.to_string()]
}

#[cfg(test)]
mod proptests;
