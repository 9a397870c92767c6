//! Attempt persistence.
//!
//! The store appends immutable `QuizAttempt` records keyed by `attemptId` and lists
//! them newest first. It looks at nothing but the id and `createdAt`; the rest of the
//! record is an opaque serialized payload.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::config::MEMORY_DATABASE;
use crate::domain::QuizAttempt;
use crate::error::StoreError;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryAttemptStore;
pub use sqlite::SqliteAttemptStore;

#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Persist one attempt. Visible to the next `list` once this returns.
    async fn save(&self, attempt: &QuizAttempt) -> Result<(), StoreError>;

    /// Up to `limit` attempts, `createdAt` descending, ties by `attemptId` descending.
    async fn list(&self, limit: usize) -> Result<Vec<QuizAttempt>, StoreError>;
}

/// Listing order shared by every store.
pub fn newest_first(a: &QuizAttempt, b: &QuizAttempt) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.attempt_id.cmp(&a.attempt_id))
}

/// Open the store selected by `database_path` (":memory:" keeps attempts in RAM).
pub fn open_store(database_path: &str) -> Result<Arc<dyn AttemptStore>, StoreError> {
    if database_path == MEMORY_DATABASE {
        info!(target: "quizsmith", "Attempt store: in-memory");
        return Ok(Arc::new(MemoryAttemptStore::new()));
    }
    let store = SqliteAttemptStore::open(database_path)?;
    info!(target: "quizsmith", path = %database_path, "Attempt store: sqlite");
    Ok(Arc::new(store))
}
