//! Tool dispatch: routing table, backend calls, fail-soft outcomes
//!
//! Every dispatch ends in a text output that is fed back to the model,
//! so backend trouble never aborts a turn.

mod dispatch;
mod http;
pub mod routes;

#[cfg(test)]
mod proptests;

pub use dispatch::{DispatchOutcome, Dispatcher, NO_TOOL_CALL};
pub use http::HttpToolBackend;
pub use routes::{CallShape, RouteConfig, RouteTable};

use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// A fully planned backend request
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    /// POST with a JSON body
    Json { url: Url, body: Value },
    /// GET with query parameters, in argument order
    Query {
        url: Url,
        params: Vec<(String, String)>,
    },
    /// Knowledge-base lookup
    Retrieval { url: Url, query: String, top_k: u32 },
}

impl BackendCall {
    pub fn shape(&self) -> CallShape {
        match self {
            BackendCall::Json { .. } => CallShape::JsonPost,
            BackendCall::Query { .. } => CallShape::QueryGet,
            BackendCall::Retrieval { .. } => CallShape::RagQuery,
        }
    }

    pub fn url(&self) -> &Url {
        match self {
            BackendCall::Json { url, .. }
            | BackendCall::Query { url, .. }
            | BackendCall::Retrieval { url, .. } => url,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolBackendError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("{0}")]
    Other(String),
}

/// Executes planned backend calls; returns the extracted reply text
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call(&self, call: &BackendCall) -> Result<String, ToolBackendError>;
}

#[async_trait]
impl<T: ToolBackend + ?Sized> ToolBackend for Arc<T> {
    async fn call(&self, call: &BackendCall) -> Result<String, ToolBackendError> {
        self.as_ref().call(call).await
    }
}

/// Reply fields checked, in order, for the tool's payload
const PAYLOAD_FIELDS: &[&str] = &["data", "result", "answer"];

/// Pull the conventional payload out of a reply body.
///
/// String fields come back verbatim, other JSON values serialized. Anything
/// that is not a JSON object with one of the fields falls back to the body.
pub fn extract_payload(body: &str) -> String {
    let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    PAYLOAD_FIELDS
        .iter()
        .find_map(|field| map.get(*field))
        .map_or_else(
            || body.to_string(),
            |value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            },
        )
}
