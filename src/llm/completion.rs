//! Text-completion backend client
//!
//! Sends `{"prompt", "max_tokens", "temperature", "stop"}` and reads
//! `{"outputs": [{"text": ...}]}`, the shape used by hosted ChatML models.

use super::types::{LlmRequest, LlmResponse};
use super::{CredentialSource, LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client for the inference endpoint
pub struct CompletionService {
    client: Client,
    url: String,
    model_id: String,
    credentials: Arc<dyn CredentialSource>,
}

impl CompletionService {
    pub fn new(
        url: impl Into<String>,
        model_id: impl Into<String>,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
            model_id: model_id.into(),
            credentials,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    outputs: Vec<CompletionOutput>,
}

#[derive(Debug, Deserialize)]
struct CompletionOutput {
    #[serde(default)]
    text: String,
}

/// Parse a successful response body into candidate outputs
fn parse_completion_body(body: &str) -> Result<LlmResponse, LlmError> {
    let parsed: CompletionBody = serde_json::from_str(body)
        .map_err(|e| LlmError::unknown(format!("Failed to parse response: {e} - body: {body}")))?;

    if parsed.outputs.is_empty() {
        return Err(LlmError::unknown("No outputs in response"));
    }

    Ok(LlmResponse {
        outputs: parsed.outputs.into_iter().map(|o| o.text).collect(),
    })
}

#[async_trait]
impl LlmService for CompletionService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let token = self.credentials.bearer_token()?;

        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), &body));
        }

        parse_completion_body(&body)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
