//! Domain models: quiz spec, questions and answer keys, responses, results and attempts.
//!
//! Everything here crosses the wire or lands in the attempt store, so field names
//! are camelCase and every type round-trips through serde unchanged.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Requested quiz difficulty.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl Difficulty {
  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// What quiz to generate. Stored verbatim with every attempt for provenance.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizSpec {
  pub topic: String,
  pub num_questions: u32,
  pub difficulty: Difficulty,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub user_context: Option<String>,
  /// Optional document excerpt the questions should be drawn from.
  #[serde(default, skip_serializing_if = "Option::is_none")] pub source_text: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceOption {
  pub id: String,
  pub text: String,
}

/// How one question is judged.
///
/// Wire form is `{"type": "...", "value": ...}`. Key types this service does not
/// know are preserved as `Other` so stored attempts stay lossless; they never score.
#[derive(Clone, Debug, PartialEq)]
pub enum AnswerKey {
  Choice(String),
  Boolean(bool),
  Text(String),
  Other { kind: String, value: serde_json::Value },
}

impl AnswerKey {
  pub fn kind(&self) -> &str {
    match self {
      AnswerKey::Choice(_) => "choice",
      AnswerKey::Boolean(_) => "boolean",
      AnswerKey::Text(_) => "text",
      AnswerKey::Other { kind, .. } => kind,
    }
  }

  fn value_json(&self) -> serde_json::Value {
    match self {
      AnswerKey::Choice(s) | AnswerKey::Text(s) => serde_json::Value::String(s.clone()),
      AnswerKey::Boolean(b) => serde_json::Value::Bool(*b),
      AnswerKey::Other { value, .. } => value.clone(),
    }
  }
}

impl Serialize for AnswerKey {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut st = serializer.serialize_struct("AnswerKey", 2)?;
    st.serialize_field("type", self.kind())?;
    st.serialize_field("value", &self.value_json())?;
    st.end()
  }
}

impl<'de> Deserialize<'de> for AnswerKey {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    #[derive(Deserialize)]
    struct Raw {
      #[serde(rename = "type")] kind: String,
      #[serde(default)] value: serde_json::Value,
    }

    let Raw { kind, value } = Raw::deserialize(deserializer)?;
    match (kind.as_str(), value) {
      ("choice", serde_json::Value::String(s)) => Ok(AnswerKey::Choice(s)),
      ("boolean", serde_json::Value::Bool(b)) => Ok(AnswerKey::Boolean(b)),
      ("text", serde_json::Value::String(s)) => Ok(AnswerKey::Text(s)),
      ("choice" | "text", _) => Err(D::Error::custom(format!("answerKey of type '{}' needs a string value", kind))),
      ("boolean", _) => Err(D::Error::custom("answerKey of type 'boolean' needs a boolean value")),
      (_, value) => Ok(AnswerKey::Other { kind: kind.clone(), value }),
    }
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
  Mcq,
  Tf,
  Short,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: QuestionType,
  pub prompt: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub choices: Option<Vec<ChoiceOption>>,
  pub answer_key: AnswerKey,
  pub explanation: String,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub tags: Option<Vec<String>>,
}

impl QuizQuestion {
  /// An mcq question needs choices and an answer key naming one of them.
  pub fn check_invariants(&self) -> Result<(), String> {
    if self.kind != QuestionType::Mcq {
      return Ok(());
    }
    let choices = match &self.choices {
      Some(c) if !c.is_empty() => c,
      _ => return Err(format!("question {} is mcq but has no choices", self.id)),
    };
    match &self.answer_key {
      AnswerKey::Choice(v) if choices.iter().any(|c| &c.id == v) => Ok(()),
      AnswerKey::Choice(v) => Err(format!("question {}: answer '{}' is not one of its choice ids", self.id, v)),
      other => Err(format!("question {} is mcq but its answer key is '{}'", self.id, other.kind())),
    }
  }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Quiz {
  pub questions: Vec<QuizQuestion>,
}

/// A submitted answer value.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum AnswerValue {
  Bool(bool),
  Text(String),
}

impl AnswerValue {
  /// String form used by choice and text comparison.
  pub fn as_text(&self) -> &str {
    match self {
      AnswerValue::Text(s) => s,
      AnswerValue::Bool(true) => "true",
      AnswerValue::Bool(false) => "false",
    }
  }

  pub fn truthy(&self) -> bool {
    match self {
      AnswerValue::Bool(b) => *b,
      AnswerValue::Text(s) => matches!(s.trim().to_lowercase().as_str(), "true" | "t" | "yes" | "1"),
    }
  }
}

/// Normalized response to one question.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseValue {
  pub value: AnswerValue,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub answered_at: Option<String>,
}

/// Question id -> response. Unanswered questions are absent.
pub type Responses = BTreeMap<String, ResponseValue>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PerQuestionResult {
  pub question_id: String,
  pub correct: bool,
  #[serde(default)] pub unanswered: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
  pub score: u32,
  pub max_score: u32,
  pub percent: f64,
  pub per_question: Vec<PerQuestionResult>,
}

/// One completed, scored attempt. The unit of storage and retrieval.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
  pub attempt_id: String,
  pub created_at: DateTime<Utc>,
  pub spec: QuizSpec,
  pub quiz: Quiz,
  pub responses: Responses,
  pub result: QuizResult,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub telemetry: Option<serde_json::Value>,
}
