//! Conversation snapshot and turn stage types

use crate::llm::GenerationConfig;
use crate::system_prompt::ToolCatalog;
use crate::tool_call;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Sentiment assumed when none has been classified yet
pub const DEFAULT_SENTIMENT: &str = "neutral";

// ============================================================================
// Messages
// ============================================================================

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Tool-role message. Content is expected to already carry the
    /// `<tool_response>` envelope; see [`Message::tool_response`].
    pub fn tool(content: impl Into<String>) -> Self {
        Self::new(Role::Tool, content)
    }

    /// Tool-role message wrapping a raw dispatch output
    pub fn tool_response(output: &str) -> Self {
        Self::tool(tool_call::wrap_tool_response(output))
    }
}

// ============================================================================
// Inbound turn
// ============================================================================

/// Role of an inbound turn as accepted from the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Tool,
}

/// A validated inbound turn (content is non-empty after trimming)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTurn {
    pub content: String,
    pub role: TurnRole,
}

impl InboundTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: TurnRole::User,
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: TurnRole::Tool,
        }
    }

    /// Tool results skip classification and enter the transcript as `tool`
    /// messages. Detected by role or by the `<tool_response>` envelope.
    pub fn is_tool_result(&self) -> bool {
        self.role == TurnRole::Tool || tool_call::is_tool_response(&self.content)
    }
}

// ============================================================================
// Conversation snapshot
// ============================================================================

/// Per-session conversation snapshot, owned by the session store between turns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationState {
    /// Raw text of the most recent inbound turn
    #[serde(default)]
    pub last_input: String,
    /// Sticky for the session once classified
    #[serde(default)]
    pub intent: Option<String>,
    /// Recomputed on every user turn
    #[serde(default)]
    pub sentiment: Option<String>,
    /// Append-only transcript
    #[serde(default)]
    pub messages: Vec<Message>,
    /// Raw tool-call payload extracted this turn
    #[serde(default)]
    pub pending_tool_call: Option<String>,
    /// Output of the most recent tool dispatch
    #[serde(default)]
    pub pending_tool_output: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sentiment_or_default(&self) -> &str {
        self.sentiment.as_deref().unwrap_or(DEFAULT_SENTIMENT)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Copy with one more transcript entry
    #[must_use]
    pub fn with_message(&self, message: Message) -> Self {
        let mut next = self.clone();
        next.messages.push(message);
        next
    }
}

// ============================================================================
// Turn state
// ============================================================================

/// Stage of a single turn. Each non-terminal stage has exactly one
/// collaborator call in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnStage {
    /// Inbound turn not yet processed
    #[default]
    Received,

    /// Waiting for the intent classifier
    ClassifyingIntent,

    /// Waiting for the sentiment classifier
    ClassifyingSentiment,

    /// Inference request in flight
    InvokingModel,

    /// Tool backend call in flight
    DispatchingTool { payload: String },

    /// Transcript updated, ready to persist
    Done,

    /// A classifier or the inference backend failed; nothing is persisted
    Failed { message: String },
}

impl TurnStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStage::Done | TurnStage::Failed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            TurnStage::Received => "received",
            TurnStage::ClassifyingIntent => "classifying_intent",
            TurnStage::ClassifyingSentiment => "classifying_sentiment",
            TurnStage::InvokingModel => "invoking_model",
            TurnStage::DispatchingTool { .. } => "dispatching_tool",
            TurnStage::Done => "done",
            TurnStage::Failed { .. } => "failed",
        }
    }
}

/// Stage plus the snapshot being built for this turn
#[derive(Debug, Clone, PartialEq)]
pub struct TurnState {
    pub stage: TurnStage,
    pub snapshot: ConversationState,
    /// Set from the inbound turn; governs classification skips and message role
    pub tool_result_turn: bool,
}

impl TurnState {
    pub fn received(snapshot: ConversationState) -> Self {
        Self {
            stage: TurnStage::Received,
            snapshot,
            tool_result_turn: false,
        }
    }
}

/// Immutable configuration for a turn
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub session_id: String,
    pub catalog: Arc<ToolCatalog>,
    pub generation: GenerationConfig,
}

impl TurnContext {
    pub fn new(
        session_id: impl Into<String>,
        catalog: Arc<ToolCatalog>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            catalog,
            generation,
        }
    }
}
