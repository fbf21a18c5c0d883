//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runner with mock implementations.

use crate::db::Database;
use crate::state_machine::state::ConversationState;
use crate::tools::{DispatchOutcome, Dispatcher};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Storage for conversation snapshots
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the live snapshot for a session, if any
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, String>;

    /// Persist the snapshot produced by a completed turn
    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), String>;
}

/// Executes a raw tool-call payload
#[async_trait]
pub trait ToolDispatcher: Send + Sync {
    async fn dispatch(&self, payload: &str) -> DispatchOutcome;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, String> {
        (**self).load(session_id).await
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), String> {
        (**self).save(session_id, state).await
    }
}

#[async_trait]
impl<T: ToolDispatcher + ?Sized> ToolDispatcher for Arc<T> {
    async fn dispatch(&self, payload: &str) -> DispatchOutcome {
        (**self).dispatch(payload).await
    }
}

// ============================================================================
// Production implementations
// ============================================================================

/// SQLite-backed session store with expiry
pub struct DatabaseStorage {
    db: Database,
    ttl: Duration,
}

impl DatabaseStorage {
    pub fn new(db: Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }
}

#[async_trait]
impl SessionStore for DatabaseStorage {
    async fn load(&self, session_id: &str) -> Result<Option<ConversationState>, String> {
        self.db
            .load_session(session_id, self.ttl)
            .map(|record| record.map(|r| r.state))
            .map_err(|e| e.to_string())
    }

    async fn save(&self, session_id: &str, state: &ConversationState) -> Result<(), String> {
        self.db
            .save_session(session_id, state)
            .map_err(|e| e.to_string())
    }
}

#[async_trait]
impl ToolDispatcher for Dispatcher {
    async fn dispatch(&self, payload: &str) -> DispatchOutcome {
        Dispatcher::dispatch(self, payload).await
    }
}
