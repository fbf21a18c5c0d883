//! Turn a raw tool-call payload into a textual outcome

use super::routes::{CallShape, RouteTable};
use super::{ToolBackend, ToolBackendError};
use crate::tool_call::ToolInvocation;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Output recorded when the model's reply carried no tool call
pub const NO_TOOL_CALL: &str = "No tool_call found.";

/// Failures surfaced alongside a dispatch output
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("malformed tool payload: {0}")]
    MalformedPayload(String),
    #[error("tool backend unavailable: {0}")]
    BackendUnavailable(String),
}

/// Every way a dispatch can end. All variants carry displayable text.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    NoCall,
    Malformed {
        output: String,
    },
    Unknown {
        name: String,
    },
    Dispatched {
        tool: String,
        shape: CallShape,
        output: String,
    },
    Failed {
        tool: String,
        output: String,
    },
}

impl DispatchOutcome {
    /// Text fed back into the conversation
    pub fn output(&self) -> String {
        match self {
            DispatchOutcome::NoCall => NO_TOOL_CALL.to_string(),
            DispatchOutcome::Unknown { name } => format!("Unknown tool: {name}"),
            DispatchOutcome::Malformed { output }
            | DispatchOutcome::Dispatched { output, .. }
            | DispatchOutcome::Failed { output, .. } => output.clone(),
        }
    }

    /// Unknown tools are a displayable result, not an error
    pub fn error(&self) -> Option<ToolError> {
        match self {
            DispatchOutcome::Malformed { output } => {
                Some(ToolError::MalformedPayload(output.clone()))
            }
            DispatchOutcome::Failed { output, .. } => {
                Some(ToolError::BackendUnavailable(output.clone()))
            }
            _ => None,
        }
    }
}

/// Routes parsed invocations to their backends
pub struct Dispatcher {
    routes: Arc<RouteTable>,
    backend: Arc<dyn ToolBackend>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>, backend: Arc<dyn ToolBackend>, timeout: Duration) -> Self {
        Self {
            routes,
            backend,
            timeout,
        }
    }

    /// Dispatch a raw payload. Never fails; see [`DispatchOutcome`].
    pub async fn dispatch(&self, payload: &str) -> DispatchOutcome {
        if payload.trim().is_empty() {
            return DispatchOutcome::NoCall;
        }

        let invocation = match ToolInvocation::parse(payload) {
            Ok(invocation) => invocation,
            Err(e) => {
                tracing::warn!(error = %e, "Tool call payload is not valid JSON");
                return DispatchOutcome::Malformed {
                    output: format!("Tool call parsing failed: {e}"),
                };
            }
        };

        let Some(call) = self.routes.plan(&invocation) else {
            tracing::info!(tool = %invocation.name, "Tool has no route");
            return DispatchOutcome::Unknown {
                name: invocation.name,
            };
        };

        let shape = call.shape();
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.backend.call(&call)).await {
            Ok(result) => result,
            Err(_) => Err(ToolBackendError::Timeout {
                url: call.url().to_string(),
            }),
        };
        let duration_ms = start.elapsed().as_millis();

        match result {
            Ok(output) => {
                tracing::info!(
                    tool = %invocation.name,
                    shape = %shape,
                    duration_ms = %duration_ms,
                    "Tool dispatched"
                );
                DispatchOutcome::Dispatched {
                    tool: invocation.name,
                    shape,
                    output,
                }
            }
            Err(e) => {
                tracing::warn!(
                    tool = %invocation.name,
                    shape = %shape,
                    duration_ms = %duration_ms,
                    error = %e,
                    "Tool backend call failed"
                );
                DispatchOutcome::Failed {
                    tool: invocation.name,
                    output: format!("Tool call failed: {e}"),
                }
            }
        }
    }
}
