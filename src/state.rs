//! Application state: the context object handed to every operation.
//!
//! This module owns:
//!   - the quiz generator (model handle + prompts), absent when no API key is configured
//!   - the attempt store handle
//!
//! Nothing else is shared between requests.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::config::{load_quiz_config, Settings};
use crate::error::StoreError;
use crate::generator::QuizGenerator;
use crate::openai::OpenAI;
use crate::store::{open_store, AttemptStore};

#[derive(Clone)]
pub struct AppState {
    pub generator: Option<QuizGenerator>,
    pub store: Arc<dyn AttemptStore>,
}

impl AppState {
    pub fn new(generator: Option<QuizGenerator>, store: Arc<dyn AttemptStore>) -> Self {
        Self { generator, store }
    }

    /// Build state from settings: load prompt config, init OpenAI, open the store.
    #[instrument(level = "info", skip_all)]
    pub fn from_settings(settings: &Settings) -> Result<Self, StoreError> {
        let cfg = load_quiz_config(settings.quiz_config_path.as_deref()).unwrap_or_default();

        let generator = match OpenAI::from_settings(settings) {
            Some(oa) => {
                info!(target: "quizsmith", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Some(QuizGenerator::new(Arc::new(oa), cfg.prompts, cfg.generation.temperature))
            }
            None => {
                warn!(target: "quizsmith", "OpenAI disabled (no OPENAI_API_KEY). Quiz generation will fail; scoring and history still work.");
                None
            }
        };

        let store = open_store(&settings.database_path)?;
        Ok(Self::new(generator, store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MEMORY_DATABASE;

    #[test]
    fn settings_without_key_leave_generation_off() {
        let settings = Settings { database_path: MEMORY_DATABASE.into(), ..Settings::default() };
        let state = AppState::from_settings(&settings).unwrap();
        assert!(state.generator.is_none());
    }

    #[test]
    fn settings_with_key_enable_generation() {
        let settings = Settings {
            database_path: MEMORY_DATABASE.into(),
            openai_api_key: Some("sk-test".into()),
            openai_model: "gpt-4o".into(),
            ..Settings::default()
        };
        let state = AppState::from_settings(&settings).unwrap();
        assert_eq!(state.generator.as_ref().map(|g| g.model_name()), Some("gpt-4o"));
    }
}
