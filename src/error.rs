use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use thiserror::Error;

use crate::protocol::ErrorOut;

/// Terminal failure of one quiz operation. Nothing is retried internally.
#[derive(Error, Debug)]
pub enum QuizError {
  #[error("invalid request: {0}")]
  Validation(String),
  #[error("quiz generation failed: {0}")]
  Generation(String),
  #[error("attempt storage failed: {0}")]
  Storage(#[from] StoreError),
}

impl QuizError {
  pub fn validation(message: impl Into<String>) -> Self {
    QuizError::Validation(message.into())
  }

  pub fn generation(message: impl Into<String>) -> Self {
    QuizError::Generation(message.into())
  }

  pub fn status(&self) -> StatusCode {
    match self {
      QuizError::Validation(_) => StatusCode::BAD_REQUEST,
      QuizError::Generation(_) => StatusCode::BAD_GATEWAY,
      QuizError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<ModelError> for QuizError {
  fn from(e: ModelError) -> Self {
    QuizError::Generation(e.to_string())
  }
}

impl IntoResponse for QuizError {
  fn into_response(self) -> Response {
    let status = self.status();
    let error = match &self {
      QuizError::Storage(e) => {
        tracing::error!(target: "quizsmith", error = %e, "Attempt storage failed");
        "attempt storage failed".to_string()
      }
      other => other.to_string(),
    };
    (status, Json(ErrorOut { error })).into_response()
  }
}

/// Failure of the external language-model call.
#[derive(Error, Debug)]
pub enum ModelError {
  #[error("model not configured (set OPENAI_API_KEY)")]
  NotConfigured,
  #[error("HTTP error: {0}")]
  Http(String),
  #[error("API error {status}: {message}")]
  Api { status: u16, message: String },
  #[error("model returned an empty response")]
  EmptyResponse,
}

#[derive(Error, Debug)]
pub enum StoreError {
  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("attempt (de)serialization error: {0}")]
  Serde(#[from] serde_json::Error),
  #[error("storage task failed: {0}")]
  Task(String),
  #[error("attempt {0} already exists")]
  Duplicate(String),
}
