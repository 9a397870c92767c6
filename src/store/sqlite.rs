//! SQLite attempt store (rusqlite).
//!
//! Table `quiz_attempts(id, created_at, data)`: `data` is the full attempt as JSON,
//! `created_at` a fixed-width RFC 3339 string (microseconds, `Z`) so text order is
//! time order. rusqlite is blocking, so every call runs on the blocking pool; the
//! connection mutex serializes writers.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::SecondsFormat;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{debug, instrument};

use super::AttemptStore;
use crate::domain::QuizAttempt;
use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS quiz_attempts (
    id         TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    data       TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_quiz_attempts_created ON quiz_attempts(created_at DESC, id DESC);
";

#[derive(Clone)]
pub struct SqliteAttemptStore {
  conn: Arc<Mutex<Connection>>,
}

impl SqliteAttemptStore {
  /// Open (or create) the database file and ensure the schema exists.
  pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
    Self::with_connection(Connection::open(path)?)
  }

  pub fn open_in_memory() -> Result<Self, StoreError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, StoreError> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Arc::new(Mutex::new(conn)) })
  }

  async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
  {
    let conn = self.conn.clone();
    tokio::task::spawn_blocking(move || {
      let guard = conn.lock().map_err(|_| StoreError::Task("sqlite connection lock poisoned".into()))?;
      f(&guard)
    })
    .await
    .map_err(|e| StoreError::Task(e.to_string()))?
  }
}

fn created_at_key(attempt: &QuizAttempt) -> String {
  attempt.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[async_trait]
impl AttemptStore for SqliteAttemptStore {
  #[instrument(level = "debug", skip(self, attempt), fields(attempt_id = %attempt.attempt_id))]
  async fn save(&self, attempt: &QuizAttempt) -> Result<(), StoreError> {
    let id = attempt.attempt_id.clone();
    let created_at = created_at_key(attempt);
    let data = serde_json::to_string(attempt)?;

    self.run(move |conn| {
      match conn.execute(
        "INSERT INTO quiz_attempts (id, created_at, data) VALUES (?1, ?2, ?3)",
        params![id, created_at, data],
      ) {
        Ok(_) => Ok(()),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
          Err(StoreError::Duplicate(id))
        }
        Err(e) => Err(e.into()),
      }
    })
    .await
  }

  #[instrument(level = "debug", skip(self))]
  async fn list(&self, limit: usize) -> Result<Vec<QuizAttempt>, StoreError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let attempts = self
      .run(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT data FROM quiz_attempts ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
          out.push(serde_json::from_str::<QuizAttempt>(&row?)?);
        }
        Ok(out)
      })
      .await?;
    debug!(count = attempts.len(), "Listed attempts");
    Ok(attempts)
  }
}
