//! Effects produced by state transitions

use crate::llm::LlmRequest;

/// Collaborator calls to be executed after a transition. At most one is
/// produced per transition; its result comes back as the next event.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ClassifyIntent { text: String },
    ClassifySentiment { text: String },
    RequestInference { request: LlmRequest },
    DispatchTool { payload: String },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Effect::ClassifyIntent { .. } => "classify_intent",
            Effect::ClassifySentiment { .. } => "classify_sentiment",
            Effect::RequestInference { .. } => "request_inference",
            Effect::DispatchTool { .. } => "dispatch_tool",
        }
    }
}
