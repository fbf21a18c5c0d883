//! Session snapshot persistence
//!
//! One row per session holding the JSON-encoded conversation snapshot.
//! Snapshots idle longer than the TTL are treated as absent, and every
//! successful load refreshes the row's `updated_at`.

mod schema;

pub use schema::*;

use crate::state_machine::state::ConversationState;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;

/// Default snapshot lifetime: five days without activity
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(5 * 24 * 60 * 60);

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid snapshot for session {session_id}: {source}")]
    Snapshot {
        session_id: String,
        source: serde_json::Error,
    },
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe database handle
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    /// Open an in-memory database (for testing)
    #[allow(dead_code)] // Used in tests
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.run_migrations()?;
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn run_migrations(&self) -> DbResult<()> {
        self.lock().execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Session Operations ====================

    /// Load a live snapshot and refresh its expiry
    pub fn load_session(&self, session_id: &str, ttl: Duration) -> DbResult<Option<SessionRecord>> {
        self.load_session_at(session_id, ttl, Utc::now())
    }

    fn load_session_at(
        &self,
        session_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> DbResult<Option<SessionRecord>> {
        let conn = self.lock();
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT state, created_at, updated_at FROM sessions WHERE session_id = ?1",
                params![session_id],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let Some((state_json, created_at, updated_at)) = row else {
            return Ok(None);
        };

        let updated_at = parse_datetime(&updated_at);
        if is_expired(updated_at, ttl, now) {
            conn.execute(
                "DELETE FROM sessions WHERE session_id = ?1",
                params![session_id],
            )?;
            return Ok(None);
        }

        let state: ConversationState =
            serde_json::from_str(&state_json).map_err(|source| DbError::Snapshot {
                session_id: session_id.to_string(),
                source,
            })?;

        conn.execute(
            "UPDATE sessions SET updated_at = ?2 WHERE session_id = ?1",
            params![session_id, format_datetime(now)],
        )?;

        Ok(Some(SessionRecord {
            session_id: session_id.to_string(),
            state,
            created_at: parse_datetime(&created_at),
            updated_at: now,
        }))
    }

    /// Insert or replace a snapshot
    pub fn save_session(&self, session_id: &str, state: &ConversationState) -> DbResult<()> {
        self.save_session_at(session_id, state, Utc::now())
    }

    fn save_session_at(
        &self,
        session_id: &str,
        state: &ConversationState,
        now: DateTime<Utc>,
    ) -> DbResult<()> {
        let state_json = serde_json::to_string(state).map_err(|source| DbError::Snapshot {
            session_id: session_id.to_string(),
            source,
        })?;
        let now = format_datetime(now);

        self.lock().execute(
            "INSERT INTO sessions (session_id, state, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(session_id) DO UPDATE SET state = ?2, updated_at = ?3",
            params![session_id, state_json, now],
        )?;
        Ok(())
    }

    /// Remove every expired snapshot; returns how many were removed
    pub fn purge_expired(&self, ttl: Duration) -> DbResult<usize> {
        self.purge_expired_at(ttl, Utc::now())
    }

    fn purge_expired_at(&self, ttl: Duration, now: DateTime<Utc>) -> DbResult<usize> {
        let Some(cutoff) = cutoff(ttl, now) else {
            return Ok(0);
        };
        let removed = self.lock().execute(
            "DELETE FROM sessions WHERE updated_at < ?1",
            params![format_datetime(cutoff)],
        )?;
        Ok(removed)
    }
}

fn cutoff(ttl: Duration, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_sub_signed(ttl))
}

fn is_expired(updated_at: DateTime<Utc>, ttl: Duration, now: DateTime<Utc>) -> bool {
    cutoff(ttl, now).is_some_and(|cutoff| updated_at < cutoff)
}

// Fixed width so that lexical order in SQL matches time order
fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc))
}
