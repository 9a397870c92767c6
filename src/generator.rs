//! Quiz generation: prompt → one model call → staged parse → validated questions.
//!
//! Parse stages, tried in order:
//!   1) strict: the reply is JSON; take the question list out of it.
//!   2) fenced: take the first ``` block (tag dropped, surrounding prose ignored) and retry 1.
//!   3) fail with a GenerationError. Content is never guessed.
//!
//! A quiz is all-or-nothing: one bad record fails the whole generation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

use crate::config::Prompts;
use crate::domain::{AnswerKey, ChoiceOption, QuestionType, QuizQuestion, QuizSpec};
use crate::error::QuizError;
use crate::model::LanguageModel;
use crate::util::{fill_template, trunc_for_log, truncate_chars};

/// Longest document excerpt folded into a prompt.
pub const MAX_SOURCE_CHARS: usize = 6000;
pub const CHOICES_PER_QUESTION: usize = 4;
const QUESTION_ID_LEN: usize = 10;

/// Which parse stage produced the question list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseStage {
  Strict,
  Fenced,
}

/// One question as the model describes it.
#[derive(Debug, Deserialize)]
struct QuestionRecord {
  prompt: String,
  choices: Vec<ChoiceOption>,
  answer: String,
  explanation: String,
  #[serde(default)] tags: Option<Vec<String>>,
}

#[derive(Clone)]
pub struct QuizGenerator {
  model: Arc<dyn LanguageModel>,
  prompts: Prompts,
  temperature: f32,
}

impl QuizGenerator {
  pub fn new(model: Arc<dyn LanguageModel>, prompts: Prompts, temperature: f32) -> Self {
    Self { model, prompts, temperature }
  }

  pub fn model_name(&self) -> &str { self.model.name() }

  /// User prompt for `spec`, with optional context and source excerpt folded in.
  pub fn build_prompt(&self, spec: &QuizSpec) -> String {
    let mut context = String::new();
    if let Some(c) = spec.user_context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
      context.push_str("\n\nAdditional context: ");
      context.push_str(c);
    }
    if let Some(src) = spec.source_text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      context.push_str("\n\nUse the following document excerpt as the primary source:\n\n");
      context.push_str(truncate_chars(src, MAX_SOURCE_CHARS));
    }

    let n = spec.num_questions.to_string();
    fill_template(
      &self.prompts.quiz_user_template,
      &[
        ("num_questions", n.as_str()),
        ("topic", spec.topic.trim()),
        ("difficulty", spec.difficulty.as_str()),
        ("context", context.as_str()),
      ],
    )
  }

  /// Generate exactly `spec.num_questions` mcq questions, or fail.
  #[instrument(level = "info", skip(self, spec), fields(topic = %spec.topic, num_questions = spec.num_questions, difficulty = %spec.difficulty, model = %self.model.name()))]
  pub async fn generate(&self, spec: &QuizSpec) -> Result<Vec<QuizQuestion>, QuizError> {
    let user = self.build_prompt(spec);
    let start = Instant::now();
    let reply = match self.model.complete_json(&self.prompts.quiz_system, &user, self.temperature).await {
      Ok(r) => r,
      Err(e) => {
        error!(target: "quiz", elapsed = ?start.elapsed(), error = %e, "Model call failed during quiz generation");
        return Err(e.into());
      }
    };

    let (stage, records) = parse_model_output(&reply).map_err(|e| {
      debug!(target: "quiz", reply = %trunc_for_log(&reply, 200), "Unparseable model reply");
      e
    })?;
    let questions = build_questions(records, spec.num_questions as usize)?;

    info!(
      target: "quiz",
      elapsed = ?start.elapsed(),
      ?stage,
      count = questions.len(),
      "Quiz generated"
    );
    Ok(questions)
  }
}

/// Stage 1: the reply is JSON as-is.
pub fn parse_strict(text: &str) -> Result<Vec<Value>, String> {
  let value: Value = serde_json::from_str(text.trim()).map_err(|e| format!("not JSON: {}", e))?;
  extract_records(value)
}

/// Stage 2 helper: text between the first ``` fence and the next one (or the end).
/// A language tag right after the opening fence (```json) is dropped. Prose around
/// the block is ignored. None when there is no fence.
pub fn strip_code_fence(text: &str) -> Option<&str> {
  let open = text.find("```")?;
  let rest = &text[open + 3..];
  let tag_len = if rest.starts_with(|c: char| c.is_ascii_alphabetic()) {
    rest.find(|c: char| !c.is_ascii_alphanumeric()).unwrap_or(rest.len())
  } else {
    0
  };
  let body = &rest[tag_len..];
  let body = match body.find("```") {
    Some(close) => &body[..close],
    None => body,
  };
  Some(body.trim())
}

/// Full pipeline: strict parse, then fenced recovery, then a GenerationError.
pub fn parse_model_output(text: &str) -> Result<(ParseStage, Vec<Value>), QuizError> {
  let strict_err = match parse_strict(text) {
    Ok(records) => return Ok((ParseStage::Strict, records)),
    Err(e) => e,
  };
  let Some(inner) = strip_code_fence(text) else {
    return Err(QuizError::generation(format!("unparseable model output ({})", strict_err)));
  };
  parse_strict(inner)
    .map(|records| (ParseStage::Fenced, records))
    .map_err(|e| QuizError::generation(format!("unparseable model output ({}; inside code fence: {})", strict_err, e)))
}

/// Locate the list of question records in a parsed reply.
///
/// A top-level list is taken as-is. In an object, `questions` wins; otherwise the
/// object must hold exactly one list-valued field. Several candidate lists are
/// ambiguous and rejected rather than guessed.
fn extract_records(value: Value) -> Result<Vec<Value>, String> {
  match value {
    Value::Array(items) => Ok(items),
    Value::Object(mut map) => {
      if let Some(q) = map.remove("questions") {
        return match q {
          Value::Array(items) => Ok(items),
          _ => Err("field 'questions' is not a list".into()),
        };
      }
      let mut lists: Vec<(String, Vec<Value>)> = map
        .into_iter()
        .filter_map(|(k, v)| match v {
          Value::Array(items) => Some((k, items)),
          _ => None,
        })
        .collect();
      match lists.len() {
        0 => Err("no list of questions in response".into()),
        1 => Ok(lists.remove(0).1),
        _ => {
          let keys: Vec<&str> = lists.iter().map(|(k, _)| k.as_str()).collect();
          Err(format!("ambiguous response: several lists ({})", keys.join(", ")))
        }
      }
    }
    _ => Err("response is neither a list nor an object".into()),
  }
}

/// Turn parsed records into questions with fresh ids. Fails on the first bad record.
fn build_questions(records: Vec<Value>, expected: usize) -> Result<Vec<QuizQuestion>, QuizError> {
  if records.len() != expected {
    return Err(QuizError::generation(format!("expected {} questions, model returned {}", expected, records.len())));
  }

  let mut rng = rand::thread_rng();
  let mut used = HashSet::with_capacity(records.len());
  let mut questions = Vec::with_capacity(records.len());

  for (idx, raw) in records.into_iter().enumerate() {
    let n = idx + 1;
    let rec: QuestionRecord = serde_json::from_value(raw)
      .map_err(|e| QuizError::generation(format!("question {}: {}", n, e)))?;

    if rec.prompt.trim().is_empty() {
      return Err(QuizError::generation(format!("question {}: empty prompt", n)));
    }
    if rec.choices.len() != CHOICES_PER_QUESTION {
      return Err(QuizError::generation(format!(
        "question {}: expected {} choices, got {}", n, CHOICES_PER_QUESTION, rec.choices.len()
      )));
    }
    let distinct: HashSet<&str> = rec.choices.iter().map(|c| c.id.as_str()).collect();
    if distinct.len() != rec.choices.len() {
      return Err(QuizError::generation(format!("question {}: duplicate choice ids", n)));
    }

    let mut id = short_id(&mut rng);
    while !used.insert(id.clone()) {
      id = short_id(&mut rng);
    }

    let q = QuizQuestion {
      id,
      kind: QuestionType::Mcq,
      prompt: rec.prompt,
      choices: Some(rec.choices),
      answer_key: AnswerKey::Choice(rec.answer.trim().to_string()),
      explanation: rec.explanation,
      tags: Some(rec.tags.unwrap_or_default()),
    };
    q.check_invariants().map_err(|e| QuizError::generation(format!("question {}: {}", n, e)))?;
    questions.push(q);
  }
  Ok(questions)
}

/// Random alphanumeric id; not derived from content, not sequential.
fn short_id(rng: &mut impl Rng) -> String {
  (0..QUESTION_ID_LEN).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;
  use crate::model::CannedModel;
  use serde_json::json;

  fn spec(n: u32) -> QuizSpec {
    QuizSpec {
      topic: "The water cycle".into(),
      num_questions: n,
      difficulty: Difficulty::Easy,
      user_context: None,
      source_text: None,
    }
  }

  fn record(answer: &str) -> Value {
    json!({
      "prompt": "What drives evaporation?",
      "choices": [
        {"id": "a", "text": "Solar energy"},
        {"id": "b", "text": "Gravity"},
        {"id": "c", "text": "Wind only"},
        {"id": "d", "text": "The moon"}
      ],
      "answer": answer,
      "explanation": "The sun heats surface water."
    })
  }

  fn generator(reply: &str) -> (QuizGenerator, Arc<CannedModel>) {
    let model = Arc::new(CannedModel::replying(reply));
    (QuizGenerator::new(model.clone(), Prompts::default(), 0.7), model)
  }

  #[test]
  fn strict_parse_reads_questions_field_and_bare_lists() {
    let obj = json!({"questions": [record("a")]}).to_string();
    assert_eq!(parse_strict(&obj).unwrap().len(), 1);
    let list = json!([record("a"), record("b")]).to_string();
    assert_eq!(parse_strict(&list).unwrap().len(), 2);
  }

  #[test]
  fn strict_parse_takes_the_single_list_under_another_key() {
    let wrapped = json!({"quiz": [record("a")], "title": "Water"}).to_string();
    assert_eq!(parse_strict(&wrapped).unwrap().len(), 1);
  }

  #[test]
  fn strict_parse_rejects_several_candidate_lists() {
    let ambiguous = json!({"items": [record("a")], "extra": [record("b")]}).to_string();
    let err = parse_strict(&ambiguous).unwrap_err();
    assert!(err.contains("ambiguous"), "{err}");
    assert!(parse_strict(r#"{"title": "no list"}"#).is_err());
    assert!(parse_strict("42").is_err());
  }

  #[test]
  fn strips_fences_with_and_without_language_tag() {
    assert_eq!(strip_code_fence("```json\n[1, 2]\n```"), Some("[1, 2]"));
    assert_eq!(strip_code_fence("  ```\n{\"a\": 1}\n```  "), Some("{\"a\": 1}"));
    assert_eq!(strip_code_fence("```[1]```"), Some("[1]"));
    assert_eq!(strip_code_fence("[1, 2]"), None);
  }

  #[test]
  fn fence_ends_at_the_closing_marker_even_with_trailing_prose() {
    let reply = "```json\n[{\"a\":1}]\n```\nHope this helps!";
    assert_eq!(strip_code_fence(reply), Some("[{\"a\":1}]"));
    assert_eq!(strip_code_fence("Here you go:\n```\n[3]\n```\nEnjoy."), Some("[3]"));

    let reply = format!("```json\n{}\n```\nLet me know if you want more.", json!([record("b")]));
    let (stage, records) = parse_model_output(&reply).unwrap();
    assert_eq!(stage, ParseStage::Fenced);
    assert_eq!(records.len(), 1);
  }

  #[test]
  fn language_tag_is_dropped_on_a_single_line_fence() {
    assert_eq!(strip_code_fence("```json [{\"a\":1}] ```"), Some("[{\"a\":1}]"));
    assert_eq!(strip_code_fence("```JSON{\"a\": 1}```"), Some("{\"a\": 1}"));

    let reply = format!("```json {} ```", json!({"questions": [record("c")]}));
    let (stage, records) = parse_model_output(&reply).unwrap();
    assert_eq!(stage, ParseStage::Fenced);
    assert_eq!(records[0]["answer"], "c");
  }

  #[test]
  fn pipeline_falls_back_to_fenced_block() {
    let fenced = format!("```json\n{}\n```", json!({"questions": [record("a")]}));
    let (stage, records) = parse_model_output(&fenced).unwrap();
    assert_eq!(stage, ParseStage::Fenced);
    assert_eq!(records.len(), 1);

    let (stage, _) = parse_model_output(&json!([record("a")]).to_string()).unwrap();
    assert_eq!(stage, ParseStage::Strict);
  }

  #[test]
  fn pipeline_fails_on_prose() {
    let err = parse_model_output("Sure! Here are your questions: 1. ...").unwrap_err();
    assert!(matches!(err, QuizError::Generation(_)));
    let err = parse_model_output("```json\nnot json either\n```").unwrap_err();
    assert!(err.to_string().contains("inside code fence"));
  }

  #[tokio::test]
  async fn generates_mcq_questions_with_fresh_ids() {
    let reply = json!({"questions": [record("a"), record("c"), record("d")]}).to_string();
    let (gen, _) = generator(&reply);
    let qs = gen.generate(&spec(3)).await.unwrap();

    assert_eq!(qs.len(), 3);
    let ids: HashSet<&str> = qs.iter().map(|q| q.id.as_str()).collect();
    assert_eq!(ids.len(), 3);
    for q in &qs {
      assert_eq!(q.kind, QuestionType::Mcq);
      assert_eq!(q.id.len(), QUESTION_ID_LEN);
      assert!(q.id.chars().all(|c| c.is_ascii_alphanumeric()));
      assert_eq!(q.choices.as_ref().unwrap().len(), 4);
      assert_eq!(q.tags, Some(vec![]));
      assert!(q.check_invariants().is_ok());
    }
    assert_eq!(qs[1].answer_key, AnswerKey::Choice("c".into()));
    let texts: Vec<&str> = qs[0].choices.as_ref().unwrap().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(texts, vec!["a", "b", "c", "d"]);
  }

  #[tokio::test]
  async fn parsing_the_same_reply_twice_differs_only_in_ids() {
    let mut rec = record("b");
    rec["tags"] = json!(["hydrology"]);
    let reply = json!({"questions": [rec]}).to_string();
    let (gen, _) = generator(&reply);

    let mut first = gen.generate(&spec(1)).await.unwrap();
    let mut second = gen.generate(&spec(1)).await.unwrap();
    assert_ne!(first[0].id, second[0].id);
    first[0].id.clear();
    second[0].id.clear();
    assert_eq!(first, second);
    assert_eq!(first[0].tags, Some(vec!["hydrology".to_string()]));
  }

  #[tokio::test]
  async fn any_bad_record_fails_the_whole_quiz() {
    let mut missing = record("a");
    missing.as_object_mut().unwrap().remove("explanation");
    let reply = json!({"questions": [record("a"), missing]}).to_string();
    let err = generator(&reply).0.generate(&spec(2)).await.unwrap_err();
    assert!(err.to_string().contains("question 2"), "{err}");

    let reply = json!({"questions": [record("e")]}).to_string();
    assert!(generator(&reply).0.generate(&spec(1)).await.is_err());

    let mut three = record("a");
    three["choices"].as_array_mut().unwrap().pop();
    let reply = json!({"questions": [three]}).to_string();
    assert!(generator(&reply).0.generate(&spec(1)).await.is_err());
  }

  #[tokio::test]
  async fn wrong_question_count_fails() {
    let reply = json!({"questions": [record("a")]}).to_string();
    let err = generator(&reply).0.generate(&spec(2)).await.unwrap_err();
    assert!(err.to_string().contains("expected 2 questions"), "{err}");
  }

  #[tokio::test]
  async fn model_failure_is_a_generation_error() {
    let gen = QuizGenerator::new(Arc::new(CannedModel::silent()), Prompts::default(), 0.7);
    let err = gen.generate(&spec(1)).await.unwrap_err();
    assert!(matches!(err, QuizError::Generation(_)));
  }

  #[tokio::test]
  async fn prompt_carries_spec_context_and_truncated_source() {
    let reply = json!({"questions": [record("a")]}).to_string();
    let (gen, model) = generator(&reply);
    let mut s = spec(1);
    s.user_context = Some("for a 5th grade class".into());
    s.source_text = Some("x".repeat(MAX_SOURCE_CHARS + 50));
    gen.generate(&s).await.unwrap();

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 1);
    let (system, user) = &prompts[0];
    assert!(system.contains("JSON"));
    assert!(user.contains("Generate 1 multiple-choice quiz questions about The water cycle."));
    assert!(user.contains("Difficulty level: easy"));
    assert!(user.contains("Additional context: for a 5th grade class"));
    assert!(user.contains(&"x".repeat(MAX_SOURCE_CHARS)));
    assert!(!user.contains(&"x".repeat(MAX_SOURCE_CHARS + 1)));
  }
}
