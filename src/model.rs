//! The language-model capability the generator depends on.
//!
//! Given a system instruction and a user prompt, a model returns text that should
//! parse into question records. It may fail or return malformed output; callers
//! treat the reply as opaque.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::ModelError;

#[async_trait]
pub trait LanguageModel: Send + Sync {
  /// Model identifier, for logs.
  fn name(&self) -> &str;

  /// One completion that the provider is asked to keep to a JSON object.
  async fn complete_json(&self, system: &str, user: &str, temperature: f32) -> Result<String, ModelError>;
}

/// Model double that replies with canned text and remembers the prompts it saw.
#[doc(hidden)]
#[derive(Debug, Default)]
pub struct CannedModel {
  reply: Option<String>,
  seen: Mutex<Vec<(String, String)>>,
}

impl CannedModel {
  pub fn replying(reply: impl Into<String>) -> Self {
    Self { reply: Some(reply.into()), seen: Mutex::new(Vec::new()) }
  }

  /// A model whose every call fails with an empty response.
  pub fn silent() -> Self { Self::default() }

  /// (system, user) pairs received so far.
  pub fn prompts(&self) -> Vec<(String, String)> {
    self.seen.lock().map(|s| s.clone()).unwrap_or_default()
  }
}

#[async_trait]
impl LanguageModel for CannedModel {
  fn name(&self) -> &str { "canned" }

  async fn complete_json(&self, system: &str, user: &str, _temperature: f32) -> Result<String, ModelError> {
    if let Ok(mut seen) = self.seen.lock() {
      seen.push((system.to_string(), user.to_string()));
    }
    self.reply.clone().ok_or(ModelError::EmptyResponse)
  }
}
