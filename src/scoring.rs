//! Scoring of submitted responses against answer keys. Pure: no I/O, no state.

use crate::domain::{AnswerKey, PerQuestionResult, Quiz, QuizResult, ResponseValue, Responses};

/// Score `responses` against `quiz`. One result per question, in quiz order.
pub fn score(quiz: &Quiz, responses: &Responses) -> QuizResult {
  let per_question: Vec<PerQuestionResult> = quiz
    .questions
    .iter()
    .map(|q| {
      let response = responses.get(&q.id);
      PerQuestionResult {
        question_id: q.id.clone(),
        correct: response.map_or(false, |r| is_correct(&q.answer_key, r)),
        unanswered: response.is_none(),
      }
    })
    .collect();

  let score = per_question.iter().filter(|r| r.correct).count() as u32;
  let max_score = per_question.len() as u32;
  QuizResult { score, max_score, percent: percent(score, max_score), per_question }
}

/// Type-specific comparison of one response against its key.
pub fn is_correct(key: &AnswerKey, response: &ResponseValue) -> bool {
  match key {
    AnswerKey::Choice(id) => response.value.as_text().trim() == id.trim(),
    AnswerKey::Boolean(expected) => response.value.truthy() == *expected,
    AnswerKey::Text(expected) => response.value.as_text().trim().to_lowercase() == expected.trim().to_lowercase(),
    AnswerKey::Other { .. } => false,
  }
}

/// score / max × 100 rounded to 2 decimals; 0.0 for an empty quiz.
pub fn percent(score: u32, max_score: u32) -> f64 {
  if max_score == 0 {
    return 0.0;
  }
  round2(f64::from(score) / f64::from(max_score) * 100.0)
}

pub fn round2(x: f64) -> f64 {
  (x * 100.0).round() / 100.0
}
