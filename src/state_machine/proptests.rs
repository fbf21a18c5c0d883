//! Property-based tests for the turn state machine
//!
//! Drives whole turns with generated collaborator replies and checks that
//! the transcript is only ever appended to.

use super::state::{ConversationState, InboundTurn, Message, Role, TurnContext, TurnStage, TurnState};
use super::{transition, Effect, Event};
use crate::llm::GenerationConfig;
use crate::system_prompt::ToolCatalog;
use crate::tools::NO_TOOL_CALL;
use proptest::prelude::*;
use std::sync::Arc;

fn context() -> TurnContext {
    TurnContext::new(
        "prop",
        Arc::new(ToolCatalog::default()),
        GenerationConfig::default(),
    )
}

#[derive(Debug, Clone)]
struct Replies {
    intent: String,
    sentiment: String,
    model: String,
    tool_output: String,
}

fn arb_turn() -> impl Strategy<Value = InboundTurn> {
    prop_oneof![
        "[a-zA-Z0-9 ?]{1,40}".prop_map(InboundTurn::user),
        "[a-zA-Z0-9{}\":]{1,30}".prop_map(InboundTurn::tool),
        "[a-z ]{1,20}".prop_map(|s| InboundTurn::user(format!("<tool_response>{s}</tool_response>"))),
    ]
}

fn arb_model_reply() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z .!]{0,60}",
        "[a-z_]{1,12}".prop_map(|name| format!(
            "Checking.\n<tool_call>{{\"name\":\"{name}\",\"arguments\":{{}}}}</tool_call>"
        )),
        Just("<tool_call>{bad json}</tool_call>".to_string()),
        Just("<tool_call> </tool_call>".to_string()),
    ]
}

fn arb_replies() -> impl Strategy<Value = Replies> {
    ("[a-z_]{1,16}", "[a-z]{1,10}", arb_model_reply(), "[a-zA-Z0-9 ]{0,30}").prop_map(
        |(intent, sentiment, model, tool_output)| Replies {
            intent,
            sentiment,
            model,
            tool_output,
        },
    )
}

/// Run one turn to completion, answering effects from `replies`
fn run_turn(snapshot: ConversationState, turn: InboundTurn, replies: &Replies) -> TurnState {
    let ctx = context();
    let mut result = transition(
        &TurnState::received(snapshot),
        &ctx,
        Event::TurnReceived { turn },
    )
    .unwrap();

    loop {
        let Some(effect) = result.effects.first().cloned() else {
            return result.new_state;
        };
        let event = match effect {
            Effect::ClassifyIntent { .. } => Event::IntentClassified {
                intent: replies.intent.clone(),
            },
            Effect::ClassifySentiment { .. } => Event::SentimentClassified {
                sentiment: replies.sentiment.clone(),
            },
            Effect::RequestInference { .. } => Event::ModelResponded {
                text: replies.model.clone(),
            },
            Effect::DispatchTool { .. } => Event::ToolDispatched {
                output: replies.tool_output.clone(),
            },
        };
        result = transition(&result.new_state, &ctx, event).unwrap();
    }
}

proptest! {
    #[test]
    fn transcript_is_append_only(
        turns in prop::collection::vec((arb_turn(), arb_replies()), 1..5)
    ) {
        let mut snapshot = ConversationState::new();
        for (turn, replies) in turns {
            let before = snapshot.messages.clone();
            let state = run_turn(snapshot, turn, &replies);
            prop_assert_eq!(&state.stage, &TurnStage::Done);
            prop_assert!(state.snapshot.messages.len() > before.len());
            prop_assert_eq!(&state.snapshot.messages[..before.len()], &before[..]);
            snapshot = state.snapshot;
        }
    }

    #[test]
    fn tool_message_appended_only_after_tool_call(turn in arb_turn(), replies in arb_replies()) {
        let state = run_turn(ConversationState::new(), turn, &replies);
        let messages = &state.snapshot.messages;
        let assistant = messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
            .unwrap();
        let has_call = replies.model.contains("<tool_call>");
        prop_assert_eq!(messages.len() - assistant - 1, usize::from(has_call));
        if has_call {
            let expected = if replies.model.contains("<tool_call> </tool_call>") {
                Message::tool_response(NO_TOOL_CALL)
            } else {
                Message::tool_response(&replies.tool_output)
            };
            prop_assert_eq!(messages.last().unwrap(), &expected);
        }
    }

    #[test]
    fn intent_is_sticky(first in arb_replies(), second in arb_replies()) {
        let after_first = run_turn(ConversationState::new(), InboundTurn::user("hello"), &first);
        let after_second = run_turn(after_first.snapshot, InboundTurn::user("again"), &second);
        prop_assert_eq!(after_second.snapshot.intent, Some(first.intent));
        prop_assert_eq!(after_second.snapshot.sentiment, Some(second.sentiment));
    }

    #[test]
    fn transition_is_deterministic(turn in arb_turn()) {
        let ctx = context();
        let state = TurnState::received(ConversationState::new());
        let a = transition(&state, &ctx, Event::TurnReceived { turn: turn.clone() }).unwrap();
        let b = transition(&state, &ctx, Event::TurnReceived { turn }).unwrap();
        prop_assert_eq!(a.new_state, b.new_state);
        prop_assert_eq!(a.effects, b.effects);
    }
}
