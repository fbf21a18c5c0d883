//! Events that drive a turn forward

use super::state::InboundTurn;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Inbound turn accepted by the transport
    TurnReceived { turn: InboundTurn },

    // Collaborator results
    IntentClassified { intent: String },
    SentimentClassified { sentiment: String },
    /// First candidate output of the inference backend, untrimmed
    ModelResponded { text: String },
    /// Dispatch always yields text, even on backend failure
    ToolDispatched { output: String },

    /// A classifier or the inference backend failed or timed out
    CollaboratorFailed { message: String },
}
