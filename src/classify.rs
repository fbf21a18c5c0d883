//! Intent and sentiment classification clients
//!
//! Both classifiers are remote services taking `{"text": ...}` and replying
//! with a single label field.

use crate::state_machine::state::Message;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Transport(String),
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("classifier reply has no string field '{field}'")]
    MissingLabel { field: String },
}

/// A remote text classifier producing one label
#[async_trait]
pub trait LabelClassifier: Send + Sync {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError>;
}

#[async_trait]
impl<T: LabelClassifier + ?Sized> LabelClassifier for Arc<T> {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        self.as_ref().classify(text).await
    }
}

/// Input for intent classification: prior transcript lines, then the input
pub fn intent_text(messages: &[Message], input: &str) -> String {
    let mut text = String::new();
    for message in messages {
        text.push_str(message.role.as_str());
        text.push_str(": ");
        text.push_str(&message.content);
        text.push('\n');
    }
    text.push_str(input);
    text
}

pub struct HttpClassifier {
    client: Client,
    url: String,
    label_field: String,
}

impl HttpClassifier {
    pub fn new(
        url: impl Into<String>,
        label_field: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClassifyError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            label_field: label_field.into(),
        })
    }

    pub fn intent(url: impl Into<String>, timeout: Duration) -> Result<Self, ClassifyError> {
        Self::new(url, "intent", timeout)
    }

    pub fn sentiment(url: impl Into<String>, timeout: Duration) -> Result<Self, ClassifyError> {
        Self::new(url, "sentiment", timeout)
    }
}

fn read_label(body: &str, field: &str) -> Result<String, ClassifyError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| ClassifyError::Transport(format!("invalid JSON reply: {e}")))?;
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ClassifyError::MissingLabel {
            field: field.to_string(),
        })
}

#[async_trait]
impl LabelClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClassifyError::Status {
                status: status.as_u16(),
                body,
            });
        }

        read_label(&body, &self.label_field)
    }
}
