//! Runtime for executing turns
//!
//! The state machine performs no locking and owns no long-lived state. This
//! layer loads the session snapshot, runs the turn under a per-session lock,
//! and persists the result.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::{StageTimeouts, TurnError, TurnRunner};
pub use traits::*;

use crate::llm::GenerationConfig;
use crate::state_machine::state::{ConversationState, InboundTurn, Message, TurnContext};
use crate::system_prompt::ToolCatalog;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

type SessionLock = Arc<tokio::sync::Mutex<()>>;

/// Serializes turns per session and handles load/save around them
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    runner: TurnRunner,
    catalog: Arc<ToolCatalog>,
    generation: GenerationConfig,
    locks: Mutex<HashMap<String, SessionLock>>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        runner: TurnRunner,
        catalog: Arc<ToolCatalog>,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            store,
            runner,
            catalog,
            generation,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Run one inbound turn and return the full updated transcript.
    ///
    /// Nothing is persisted when the turn fails.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        turn: InboundTurn,
    ) -> Result<Vec<Message>, TurnError> {
        let lock = self.session_lock(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_locked(session_id, turn).await
        };
        drop(lock);
        self.prune_idle_locks();
        result
    }

    async fn run_locked(
        &self,
        session_id: &str,
        turn: InboundTurn,
    ) -> Result<Vec<Message>, TurnError> {
        let snapshot = self
            .store
            .load(session_id)
            .await
            .map_err(TurnError::Storage)?
            .unwrap_or_else(ConversationState::new);

        let context = TurnContext::new(session_id, self.catalog.clone(), self.generation.clone());
        let updated = self.runner.run(&context, snapshot, turn).await?;

        self.store
            .save(session_id, &updated)
            .await
            .map_err(TurnError::Storage)?;

        tracing::info!(
            session_id = %session_id,
            intent = updated.intent.as_deref().unwrap_or_default(),
            messages = updated.messages.len(),
            "Turn completed"
        );
        Ok(updated.messages)
    }

    fn session_lock(&self, session_id: &str) -> SessionLock {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop lock entries no turn is holding or waiting on
    fn prune_idle_locks(&self) {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
