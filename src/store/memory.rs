//! In-memory attempt store. Used for tests and when no database file is wanted.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::instrument;

use super::{newest_first, AttemptStore};
use crate::domain::QuizAttempt;
use crate::error::StoreError;

/// Attempts kept sorted newest first.
#[derive(Default)]
pub struct MemoryAttemptStore {
  attempts: RwLock<Vec<QuizAttempt>>,
}

impl MemoryAttemptStore {
  pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl AttemptStore for MemoryAttemptStore {
  #[instrument(level = "debug", skip(self, attempt), fields(attempt_id = %attempt.attempt_id))]
  async fn save(&self, attempt: &QuizAttempt) -> Result<(), StoreError> {
    let mut attempts = self.attempts.write().await;
    if attempts.iter().any(|a| a.attempt_id == attempt.attempt_id) {
      return Err(StoreError::Duplicate(attempt.attempt_id.clone()));
    }
    let pos = attempts.partition_point(|a| newest_first(a, attempt).is_lt());
    attempts.insert(pos, attempt.clone());
    Ok(())
  }

  #[instrument(level = "debug", skip(self))]
  async fn list(&self, limit: usize) -> Result<Vec<QuizAttempt>, StoreError> {
    let attempts = self.attempts.read().await;
    Ok(attempts.iter().take(limit).cloned().collect())
  }
}
