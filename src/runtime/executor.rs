//! Turn runner: drives the pure state machine by executing its effects
//!
//! Each effect is one collaborator call. Its result is turned into the next
//! event until the turn reaches a terminal stage.

use super::traits::ToolDispatcher;
use crate::classify::{ClassifyError, LabelClassifier};
use crate::llm::{LlmError, LlmService};
use crate::state_machine::state::{ConversationState, InboundTurn, TurnContext, TurnStage, TurnState};
use crate::state_machine::{transition, Effect, Event, TransitionError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Bounds on collaborator calls that abort the turn on failure.
/// Tool calls are bounded by the dispatcher itself.
#[derive(Debug, Clone, Copy)]
pub struct StageTimeouts {
    pub classify: Duration,
    pub inference: Duration,
}

impl Default for StageTimeouts {
    fn default() -> Self {
        Self {
            classify: Duration::from_secs(10),
            inference: Duration::from_secs(60),
        }
    }
}

/// Why a turn could not complete. Never shown to end users verbatim.
#[derive(Debug, Error)]
pub enum TurnError {
    #[error("{stage} classification failed: {source}")]
    Classification {
        stage: &'static str,
        source: ClassifyError,
    },
    #[error("inference failed: {0}")]
    Inference(#[from] LlmError),
    #[error("inference returned no candidate output")]
    EmptyCompletion,
    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: &'static str, after: Duration },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("session storage failed: {0}")]
    Storage(String),
}

pub struct TurnRunner {
    intent: Arc<dyn LabelClassifier>,
    sentiment: Arc<dyn LabelClassifier>,
    llm: Arc<dyn LlmService>,
    tools: Arc<dyn ToolDispatcher>,
    timeouts: StageTimeouts,
}

impl TurnRunner {
    pub fn new(
        intent: Arc<dyn LabelClassifier>,
        sentiment: Arc<dyn LabelClassifier>,
        llm: Arc<dyn LlmService>,
        tools: Arc<dyn ToolDispatcher>,
        timeouts: StageTimeouts,
    ) -> Self {
        Self {
            intent,
            sentiment,
            llm,
            tools,
            timeouts,
        }
    }

    /// Run one turn against `snapshot`, returning the updated snapshot
    pub async fn run(
        &self,
        context: &TurnContext,
        snapshot: ConversationState,
        turn: InboundTurn,
    ) -> Result<ConversationState, TurnError> {
        let mut result = transition(
            &TurnState::received(snapshot),
            context,
            Event::TurnReceived { turn },
        )?;

        while let Some(effect) = result.effects.pop() {
            let stage = result.new_state.stage.name();
            let effect_name = effect.name();
            let event = match self.execute_effect(effect).await {
                Ok(event) => event,
                Err(e) => {
                    let failed = transition(
                        &result.new_state,
                        context,
                        Event::CollaboratorFailed {
                            message: e.to_string(),
                        },
                    )?;
                    tracing::error!(
                        session_id = %context.session_id,
                        stage,
                        effect = effect_name,
                        outcome = failed.new_state.stage.name(),
                        messages = failed.new_state.snapshot.messages.len(),
                        error = %e,
                        "Turn aborted"
                    );
                    return Err(e);
                }
            };
            result = transition(&result.new_state, context, event)?;
        }

        match result.new_state.stage {
            TurnStage::Done => Ok(result.new_state.snapshot),
            stage => Err(TransitionError::InvalidTransition(format!(
                "turn stopped in non-terminal stage {}",
                stage.name()
            ))
            .into()),
        }
    }

    async fn execute_effect(&self, effect: Effect) -> Result<Event, TurnError> {
        match effect {
            Effect::ClassifyIntent { text } => {
                let intent = self
                    .classify("intent", self.intent.as_ref(), &text)
                    .await?;
                Ok(Event::IntentClassified { intent })
            }

            Effect::ClassifySentiment { text } => {
                let sentiment = self
                    .classify("sentiment", self.sentiment.as_ref(), &text)
                    .await?;
                Ok(Event::SentimentClassified { sentiment })
            }

            Effect::RequestInference { request } => {
                let response =
                    with_timeout("inference", self.timeouts.inference, self.llm.complete(&request))
                        .await??;
                let text = response
                    .first_text()
                    .ok_or(TurnError::EmptyCompletion)?
                    .to_string();
                Ok(Event::ModelResponded { text })
            }

            Effect::DispatchTool { payload } => {
                let outcome = self.tools.dispatch(&payload).await;
                if let Some(error) = outcome.error() {
                    tracing::warn!(error = %error, "Tool dispatch degraded to text");
                }
                Ok(Event::ToolDispatched {
                    output: outcome.output(),
                })
            }
        }
    }

    async fn classify(
        &self,
        stage: &'static str,
        classifier: &dyn LabelClassifier,
        text: &str,
    ) -> Result<String, TurnError> {
        let start = Instant::now();
        let label = with_timeout(stage, self.timeouts.classify, classifier.classify(text))
            .await?
            .map_err(|source| TurnError::Classification { stage, source })?;
        tracing::info!(
            stage,
            label = %label,
            duration_ms = %start.elapsed().as_millis(),
            "Classified"
        );
        Ok(label)
    }
}

async fn with_timeout<F: Future>(
    stage: &'static str,
    after: Duration,
    future: F,
) -> Result<F::Output, TurnError> {
    tokio::time::timeout(after, future)
        .await
        .map_err(|_| TurnError::Timeout { stage, after })
}
