//! Runtime settings (environment) and quiz prompt configuration (TOML).
//!
//! Environment, read after an optional `.env`:
//!   PORT                 : u16 (default 3000)
//!   DATABASE_PATH        : SQLite file for attempts (default "quiz_attempts.db"; ":memory:" keeps them in RAM)
//!   OPENAI_API_KEY       : enables quiz generation if present
//!   OPENAI_BASE_URL      : default "https://api.openai.com/v1"
//!   OPENAI_QUIZ_MODEL    : default "gpt-4o-mini"
//!   OPENAI_TIMEOUT_SECS  : per-request timeout of the model call (default 60)
//!   QUIZ_CONFIG_PATH     : path to TOML config (prompts + generation temperature)
//!
//! See `QuizConfig` and `Prompts` for the TOML schema.

use serde::Deserialize;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_PATH: &str = "quiz_attempts.db";
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Clone, Debug)]
pub struct Settings {
  pub port: u16,
  pub database_path: String,
  pub openai_api_key: Option<String>,
  pub openai_base_url: String,
  pub openai_model: String,
  pub openai_timeout_secs: u64,
  pub quiz_config_path: Option<String>,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      port: DEFAULT_PORT,
      database_path: DEFAULT_DATABASE_PATH.into(),
      openai_api_key: None,
      openai_base_url: "https://api.openai.com/v1".into(),
      openai_model: "gpt-4o-mini".into(),
      openai_timeout_secs: 60,
      quiz_config_path: None,
    }
  }
}

impl Settings {
  pub fn from_env() -> Self {
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Build settings from any key lookup; unparsable values fall back to defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
    let d = Self::default();
    let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    Self {
      port: non_empty("PORT").and_then(|p| p.parse().ok()).unwrap_or(d.port),
      database_path: non_empty("DATABASE_PATH").unwrap_or(d.database_path),
      openai_api_key: non_empty("OPENAI_API_KEY"),
      openai_base_url: non_empty("OPENAI_BASE_URL").unwrap_or(d.openai_base_url),
      openai_model: non_empty("OPENAI_QUIZ_MODEL").unwrap_or(d.openai_model),
      openai_timeout_secs: non_empty("OPENAI_TIMEOUT_SECS").and_then(|s| s.parse().ok()).unwrap_or(d.openai_timeout_secs),
      quiz_config_path: non_empty("QUIZ_CONFIG_PATH"),
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub generation: GenerationCfg,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationCfg {
  /// Some variety between quizzes on the same topic, not fully random.
  pub temperature: f32,
}

impl Default for GenerationCfg {
  fn default() -> Self { Self { temperature: 0.7 } }
}

/// Prompts used for quiz generation. Any field left out of the TOML keeps its default.
///
/// `quiz_user_template` placeholders: `{num_questions}`, `{topic}`, `{difficulty}`, `{context}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub quiz_system: String,
  pub quiz_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_system: "You are a helpful quiz generator. Always respond with valid JSON only, no markdown formatting and no prose.".into(),
      quiz_user_template: r#"Generate {num_questions} multiple-choice quiz questions about {topic}.
Difficulty level: {difficulty}{context}

For each question, provide:
1. A clear question prompt
2. Exactly 4 answer choices with ids a, b, c, d
3. The id of the correct choice
4. A brief explanation of why the answer is correct
5. Optionally, a few short topic tags

Return a JSON object with this exact structure:
{"questions": [
  {
    "prompt": "question text",
    "choices": [
      {"id": "a", "text": "choice A text"},
      {"id": "b", "text": "choice B text"},
      {"id": "c", "text": "choice C text"},
      {"id": "d", "text": "choice D text"}
    ],
    "answer": "a",
    "explanation": "explanation text",
    "tags": ["tag1", "tag2"]
  }
]}

Return exactly {num_questions} questions appropriate for {difficulty} difficulty."#.into(),
    }
  }
}

impl QuizConfig {
  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str(s)
  }
}

/// Attempt to load `QuizConfig` from the given path. On any parsing/IO error, returns None.
pub fn load_quiz_config(path: Option<&str>) -> Option<QuizConfig> {
  let path = path?;
  match std::fs::read_to_string(path) {
    Ok(s) => match QuizConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "quizsmith", %path, "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "quizsmith", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "quizsmith", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
