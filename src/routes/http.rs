//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs parameters and basic result info.
//! Extractor rejections are turned into `QuizError::Validation` so every error body
//! has the same `{"error": ...}` shape.

use std::sync::Arc;

use axum::{
  extract::{rejection::{JsonRejection, QueryRejection}, Query, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument, warn};

use crate::domain::{Quiz, QuizAttempt, QuizSpec};
use crate::error::QuizError;
use crate::logic::*;
use crate::protocol::*;
use crate::report::ReportCard;
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(health()) }

#[instrument(level = "info", skip(state, body))]
pub async fn http_generate_quiz(
  State(state): State<Arc<AppState>>,
  body: Result<Json<QuizSpec>, JsonRejection>,
) -> Result<Json<Quiz>, QuizError> {
  let Json(spec) = body.map_err(|e| QuizError::validation(e.body_text()))?;
  match generate_quiz(&state, &spec).await {
    Ok(quiz) => {
      info!(target: "quiz", topic = %spec.topic, count = quiz.questions.len(), "HTTP quiz generated");
      Ok(Json(quiz))
    }
    Err(e) => {
      warn!(target: "quiz", topic = %spec.topic, error = %e, "HTTP quiz generation failed");
      Err(e)
    }
  }
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_score_and_save(
  State(state): State<Arc<AppState>>,
  body: Result<Json<ScoreIn>, JsonRejection>,
) -> Result<Json<QuizAttempt>, QuizError> {
  let Json(body) = body.map_err(|e| QuizError::validation(e.body_text()))?;
  let responses = normalize_responses(body.responses)?;
  let attempt = score_and_save(&state, body.spec, body.quiz, responses, body.telemetry).await?;
  info!(target: "quiz", attempt_id = %attempt.attempt_id, percent = attempt.result.percent, "HTTP attempt saved");
  Ok(Json(attempt))
}

#[instrument(level = "info", skip(state, query))]
pub async fn http_list_attempts(
  State(state): State<Arc<AppState>>,
  query: Result<Query<AttemptsQuery>, QueryRejection>,
) -> Result<Json<Vec<QuizAttempt>>, QuizError> {
  let Query(q) = query.map_err(|e| QuizError::validation(e.body_text()))?;
  let attempts = list_attempts(&state, q.limit).await?;
  info!(target: "quiz", limit = ?q.limit, count = attempts.len(), "HTTP attempts listed");
  Ok(Json(attempts))
}

#[instrument(level = "info", skip(state))]
pub async fn http_report_card(State(state): State<Arc<AppState>>) -> Result<Json<ReportCard>, QuizError> {
  Ok(Json(report_card(&state).await?))
}

pub async fn http_not_found() -> impl IntoResponse {
  (StatusCode::NOT_FOUND, Json(ErrorOut { error: "not found".into() }))
}
