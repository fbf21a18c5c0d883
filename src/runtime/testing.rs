//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::SessionStore;
use crate::classify::{ClassifyError, LabelClassifier};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::state_machine::state::ConversationState;
use crate::tools::{BackendCall, CallShape, ToolBackend, ToolBackendError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

// ============================================================================
// Mock Classifier
// ============================================================================

/// Classifier returning a fixed result and recording its inputs
pub struct MockClassifier {
    result: Result<String, ClassifyError>,
    delay: Option<Duration>,
    texts: Mutex<Vec<String>>,
}

impl MockClassifier {
    pub fn fixed(label: impl Into<String>) -> Self {
        Self {
            result: Ok(label.into()),
            delay: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: ClassifyError) -> Self {
        Self {
            result: Err(error),
            delay: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Texts passed to `classify`, in call order
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelClassifier for MockClassifier {
    async fn classify(&self, text: &str) -> Result<String, ClassifyError> {
        self.texts.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.result.clone()
    }
}

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock inference backend that returns queued responses
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
    delay: Option<Duration>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Stub Tool Backend
// ============================================================================

/// Tool backend recording every planned call
pub struct StubToolBackend {
    reply: Result<String, ToolBackendError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<BackendCall>>,
}

impl StubToolBackend {
    pub fn new() -> Self {
        Self {
            reply: Ok("ok".to_string()),
            delay: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = Ok(reply.into());
        self
    }

    pub fn with_error(mut self, error: ToolBackendError) -> Self {
        self.reply = Err(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn shapes(&self) -> Vec<CallShape> {
        self.calls().iter().map(BackendCall::shape).collect()
    }
}

#[async_trait]
impl ToolBackend for StubToolBackend {
    async fn call(&self, call: &BackendCall) -> Result<String, ToolBackendError> {
        self.calls.lock().unwrap().push(call.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone()
    }
}

// ============================================================================
// In-memory Session Store
// ============================================================================

#[derive(Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<String, ConversationState>>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_saves() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn get(&self, session_id: &str) -> Option<ConversationState> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, String> {
        Ok(self.get(session_id))
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), String> {
        if self.fail_saves {
            return Err("disk full".to_string());
        }
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), state.clone());
        Ok(())
    }
}
