//! Core operations behind the HTTP handlers.
//!
//! This includes:
//!   - Generating a quiz from a spec (validated first)
//!   - Scoring responses and persisting the attempt
//!   - Listing attempts and the report card
//!
//! Every error is terminal for the call; nothing is retried here.

use chrono::{SubsecRound, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Quiz, QuizAttempt, QuizSpec, Responses};
use crate::error::{ModelError, QuizError};
use crate::protocol::{HealthOut, DEFAULT_LIST_LIMIT};
use crate::report::{report_card as summarize, ReportCard};
use crate::scoring::score;
use crate::state::AppState;

pub const MAX_QUESTIONS: u32 = 50;

/// Reject specs that cannot produce a quiz.
pub fn validate_spec(spec: &QuizSpec) -> Result<(), QuizError> {
  validate_stored_spec(spec)?;
  if spec.num_questions > MAX_QUESTIONS {
    return Err(QuizError::validation(format!("numQuestions must be between 1 and {}", MAX_QUESTIONS)));
  }
  Ok(())
}

/// Shape check for a spec recorded with an attempt. No generation cap applies.
pub fn validate_stored_spec(spec: &QuizSpec) -> Result<(), QuizError> {
  if spec.topic.trim().is_empty() {
    return Err(QuizError::validation("topic must not be empty"));
  }
  if spec.num_questions == 0 {
    return Err(QuizError::validation("numQuestions must be at least 1"));
  }
  Ok(())
}

#[instrument(level = "info", skip(state, spec), fields(topic = %spec.topic, num_questions = spec.num_questions))]
pub async fn generate_quiz(state: &AppState, spec: &QuizSpec) -> Result<Quiz, QuizError> {
  validate_spec(spec)?;
  let generator = state.generator.as_ref().ok_or(ModelError::NotConfigured)?;
  let questions = generator.generate(spec).await?;
  Ok(Quiz { questions })
}

/// Score `responses` against `quiz` and persist the attempt. A failed save fails the call.
#[instrument(level = "info", skip_all, fields(topic = %spec.topic, questions = quiz.questions.len(), answered = responses.len()))]
pub async fn score_and_save(
  state: &AppState,
  spec: QuizSpec,
  quiz: Quiz,
  responses: Responses,
  telemetry: Option<serde_json::Value>,
) -> Result<QuizAttempt, QuizError> {
  validate_stored_spec(&spec)?;
  let result = score(&quiz, &responses);

  let attempt = QuizAttempt {
    attempt_id: Uuid::new_v4().to_string(),
    created_at: Utc::now().trunc_subsecs(6),
    spec,
    quiz,
    responses,
    result,
    telemetry: telemetry.filter(|t| !t.is_null()),
  };
  state.store.save(&attempt).await?;

  info!(
    target: "quiz",
    attempt_id = %attempt.attempt_id,
    score = attempt.result.score,
    max_score = attempt.result.max_score,
    percent = attempt.result.percent,
    "Attempt scored and saved"
  );
  Ok(attempt)
}

#[instrument(level = "info", skip(state))]
pub async fn list_attempts(state: &AppState, limit: Option<usize>) -> Result<Vec<QuizAttempt>, QuizError> {
  let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT);
  Ok(state.store.list(limit).await?)
}

#[instrument(level = "info", skip(state))]
pub async fn report_card(state: &AppState) -> Result<ReportCard, QuizError> {
  let attempts = state.store.list(usize::MAX).await?;
  Ok(summarize(&attempts))
}

pub fn health() -> HealthOut {
  HealthOut { status: "ok".into() }
}
