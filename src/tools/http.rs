//! reqwest-backed tool backend

use super::{extract_payload, BackendCall, ToolBackend, ToolBackendError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub struct HttpToolBackend {
    client: Client,
}

impl HttpToolBackend {
    pub fn new(timeout: Duration) -> Result<Self, ToolBackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ToolBackendError::Other(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

fn send_error(url: &str, e: &reqwest::Error) -> ToolBackendError {
    if e.is_timeout() {
        ToolBackendError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        ToolBackendError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        ToolBackendError::Other(format!("Request to {url} failed: {e}"))
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn call(&self, call: &BackendCall) -> Result<String, ToolBackendError> {
        let url = call.url().as_str();
        let request = match call {
            BackendCall::Json { url, body } => self.client.post(url.clone()).json(body),
            BackendCall::Query { url, params } => self.client.get(url.clone()).query(params),
            BackendCall::Retrieval { url, query, top_k } => self
                .client
                .post(url.clone())
                .json(&json!({ "query": query, "top_k": top_k })),
        };

        let response = request.send().await.map_err(|e| send_error(url, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| send_error(url, &e))?;

        if !status.is_success() {
            return Err(ToolBackendError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(extract_payload(&body))
    }
}
