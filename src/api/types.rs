//! API request and response types

use crate::state_machine::state::{InboundTurn, Message, TurnRole};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session used when the client does not send one
pub const ANONYMOUS_SESSION: &str = "anonymous-session";

/// `POST /chat` body
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Kept loose so shape errors get the validation message below
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl ChatRequest {
    pub fn session_id(&self) -> &str {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or(ANONYMOUS_SESSION)
    }

    /// Validate the message into a turn, or return the client-facing reason
    pub fn to_turn(&self) -> Result<InboundTurn, &'static str> {
        let Some(Value::Object(message)) = &self.message else {
            return Err("Missing or invalid 'message' object.");
        };

        let content = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();
        if content.is_empty() {
            return Err("Message content is empty.");
        }

        let role = match message.get("role").and_then(Value::as_str).map(str::trim) {
            Some("user") => TurnRole::User,
            Some("tool") => TurnRole::Tool,
            _ => return Err("Invalid message role. Must be 'user' or 'tool'."),
        };

        Ok(InboundTurn {
            content: content.to_string(),
            role,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
