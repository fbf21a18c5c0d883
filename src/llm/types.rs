//! Common types for inference requests

use crate::chat_template;
use serde::{Deserialize, Serialize};

/// Default bound on generated tokens per turn
pub const DEFAULT_MAX_TOKENS: u32 = 384;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Text-completion request sent to the inference backend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LlmRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

/// Inference response: candidate outputs in backend order
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub outputs: Vec<String>,
}

impl LlmResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            outputs: vec![text.into()],
        }
    }

    /// The first candidate, which is the only one the orchestrator uses
    pub fn first_text(&self) -> Option<&str> {
        self.outputs.first().map(String::as_str)
    }
}

/// Fixed generation settings applied to every model turn
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub stop: Vec<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            stop: chat_template::stop_sequences(),
        }
    }
}

impl GenerationConfig {
    pub fn request(&self, prompt: String) -> LlmRequest {
        LlmRequest {
            prompt,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stop: self.stop.clone(),
        }
    }
}
