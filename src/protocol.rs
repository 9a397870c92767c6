//! Public protocol structs for the HTTP endpoints (serde ready), plus the boundary
//! normalization of submitted responses.
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{AnswerValue, Quiz, QuizSpec, ResponseValue, Responses};
use crate::error::QuizError;

pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Body of `POST /api/attempts/score-and-save`.
///
/// `responses` is kept raw here: clients send bare strings, booleans, numbers, or
/// objects with a `value` field. See `normalize_responses`.
#[derive(Debug, Deserialize)]
pub struct ScoreIn {
    pub spec: QuizSpec,
    pub quiz: Quiz,
    pub responses: Map<String, Value>,
    #[serde(default)]
    pub telemetry: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct AttemptsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthOut {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorOut {
    pub error: String,
}

/// Bring every response into `{value, answeredAt}` form.
///
/// `null` (bare or as `value`) means unanswered and the entry is dropped.
pub fn normalize_responses(raw: Map<String, Value>) -> Result<Responses, QuizError> {
    let mut out = Responses::new();
    for (question_id, v) in raw {
        let normalized = match v {
            Value::Object(mut obj) => {
                let answered_at = match obj.remove("answeredAt") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s),
                    Some(_) => {
                        return Err(QuizError::validation(format!(
                            "response '{}': answeredAt must be a string",
                            question_id
                        )))
                    }
                };
                let value = obj.remove("value").ok_or_else(|| {
                    QuizError::validation(format!("response '{}' has no value field", question_id))
                })?;
                scalar(&question_id, value)?.map(|value| ResponseValue { value, answered_at })
            }
            other => scalar(&question_id, other)?.map(|value| ResponseValue { value, answered_at: None }),
        };
        if let Some(r) = normalized {
            out.insert(question_id, r);
        }
    }
    Ok(out)
}

fn scalar(question_id: &str, v: Value) -> Result<Option<AnswerValue>, QuizError> {
    match v {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(AnswerValue::Bool(b))),
        Value::String(s) => Ok(Some(AnswerValue::Text(s))),
        Value::Number(n) => Ok(Some(AnswerValue::Text(n.to_string()))),
        Value::Array(_) | Value::Object(_) => Err(QuizError::validation(format!(
            "response '{}' must be a string, boolean, or number",
            question_id
        ))),
    }
}
