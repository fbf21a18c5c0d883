//! Pure state transition function
//!
//! Stage order per turn:
//! received -> intent -> sentiment -> model -> tool dispatch -> done.
//! Tool-result turns skip both classification stages; a known intent skips
//! the intent stage. The transcript only ever grows.

use super::state::{ConversationState, InboundTurn, Message, TurnContext, TurnStage, TurnState};
use super::{Effect, Event};
use crate::chat_template;
use crate::classify;
use crate::tool_call;
use crate::tools::NO_TOOL_CALL;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function: no I/O, same inputs give the same outputs.
pub fn transition(
    state: &TurnState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (&state.stage, event) {
        (TurnStage::Received, Event::TurnReceived { turn }) => Ok(receive(state, context, &turn)),

        (TurnStage::ClassifyingIntent, Event::IntentClassified { intent }) => {
            let mut snapshot = state.snapshot.clone();
            snapshot.intent = non_blank(intent);
            Ok(classify_sentiment(state, snapshot))
        }

        (TurnStage::ClassifyingSentiment, Event::SentimentClassified { sentiment }) => {
            let mut snapshot = state.snapshot.clone();
            snapshot.sentiment = non_blank(sentiment);
            let message = Message::user(prefixed_input(&snapshot));
            Ok(invoke_model(state, context, snapshot.with_message(message)))
        }

        (TurnStage::InvokingModel, Event::ModelResponded { text }) => {
            let reply = Message::assistant(text.trim());
            let payload = tool_call::extract(&reply);
            let has_block = tool_call::has_tool_call_block(&reply);
            let mut snapshot = state.snapshot.with_message(reply);
            snapshot.pending_tool_call.clone_from(&payload);

            match payload {
                Some(payload) => Ok(TransitionResult::new(TurnState {
                    stage: TurnStage::DispatchingTool {
                        payload: payload.clone(),
                    },
                    snapshot,
                    tool_result_turn: state.tool_result_turn,
                })
                .with_effect(Effect::DispatchTool { payload })),
                None => {
                    // An empty block still gets its tool turn, with no dispatch
                    if has_block {
                        snapshot = snapshot.with_message(Message::tool_response(NO_TOOL_CALL));
                    }
                    snapshot.pending_tool_output = Some(NO_TOOL_CALL.to_string());
                    Ok(TransitionResult::new(TurnState {
                        stage: TurnStage::Done,
                        snapshot,
                        tool_result_turn: state.tool_result_turn,
                    }))
                }
            }
        }

        (TurnStage::DispatchingTool { .. }, Event::ToolDispatched { output }) => {
            let mut snapshot = state.snapshot.with_message(Message::tool_response(&output));
            snapshot.pending_tool_output = Some(output);
            Ok(TransitionResult::new(TurnState {
                stage: TurnStage::Done,
                snapshot,
                tool_result_turn: state.tool_result_turn,
            }))
        }

        (
            TurnStage::ClassifyingIntent
            | TurnStage::ClassifyingSentiment
            | TurnStage::InvokingModel,
            Event::CollaboratorFailed { message },
        ) => Ok(TransitionResult::new(TurnState {
            stage: TurnStage::Failed { message },
            snapshot: state.snapshot.clone(),
            tool_result_turn: state.tool_result_turn,
        })),

        (stage, event) => Err(TransitionError::InvalidTransition(format!(
            "No transition from {} with {event:?}",
            stage.name()
        ))),
    }
}

fn receive(state: &TurnState, context: &TurnContext, turn: &InboundTurn) -> TransitionResult {
    let mut snapshot = state.snapshot.clone();
    snapshot.last_input.clone_from(&turn.content);
    snapshot.pending_tool_call = None;

    if turn.is_tool_result() {
        let content = if tool_call::is_tool_response(&turn.content) {
            turn.content.clone()
        } else {
            tool_call::wrap_tool_response(&turn.content)
        };
        let next = TurnState {
            tool_result_turn: true,
            ..state.clone()
        };
        return invoke_model(&next, context, snapshot.with_message(Message::tool(content)));
    }

    let next = TurnState {
        tool_result_turn: false,
        ..state.clone()
    };

    if snapshot.intent.is_some() {
        return classify_sentiment(&next, snapshot);
    }

    let text = classify::intent_text(&snapshot.messages, &snapshot.last_input);
    TransitionResult::new(TurnState {
        stage: TurnStage::ClassifyingIntent,
        snapshot,
        tool_result_turn: false,
    })
    .with_effect(Effect::ClassifyIntent { text })
}

fn classify_sentiment(state: &TurnState, snapshot: ConversationState) -> TransitionResult {
    let text = snapshot.last_input.clone();
    TransitionResult::new(TurnState {
        stage: TurnStage::ClassifyingSentiment,
        snapshot,
        tool_result_turn: state.tool_result_turn,
    })
    .with_effect(Effect::ClassifySentiment { text })
}

fn invoke_model(
    state: &TurnState,
    context: &TurnContext,
    snapshot: ConversationState,
) -> TransitionResult {
    let request = context.generation.request(build_prompt(&snapshot, context));
    TransitionResult::new(TurnState {
        stage: TurnStage::InvokingModel,
        snapshot,
        tool_result_turn: state.tool_result_turn,
    })
    .with_effect(Effect::RequestInference { request })
}

/// Blank classifier labels leave the field unset
fn non_blank(label: String) -> Option<String> {
    let label = label.trim();
    (!label.is_empty()).then(|| label.to_string())
}

/// `[intent=X][sentiment=Y] input`, as the model sees a user turn
fn prefixed_input(snapshot: &ConversationState) -> String {
    format!(
        "[intent={}][sentiment={}] {}",
        snapshot.intent.as_deref().unwrap_or_default(),
        snapshot.sentiment_or_default(),
        snapshot.last_input
    )
}

/// Render the prompt: a system instruction for the current intent (empty
/// when unset) followed by the transcript. The system message is not stored.
pub fn build_prompt(snapshot: &ConversationState, context: &TurnContext) -> String {
    let instruction = snapshot
        .intent
        .as_deref()
        .map(|intent| context.catalog.render(intent))
        .unwrap_or_default();

    let mut messages = Vec::with_capacity(snapshot.messages.len() + 1);
    messages.push(Message::system(instruction));
    messages.extend(snapshot.messages.iter().cloned());
    chat_template::render(&messages)
}
