//! Shared application state, wiring every other crate's public
//! surface behind `Arc`s the handlers borrow from `axum::extract::State`.
//! One `Arc<...>` per collaborator since each is already internally
//! synchronized and none need a single global lock.

use std::sync::Arc;

use aqa_generate::Generator;
use aqa_llm::{Backend, Provider, RealProvider};
use aqa_orchestrate::RunOptions;
use aqa_storage::{CacheStore, FileCacheStore, FileVersionStore, HistoryStore, VersionStore};
use aqa_validate::ValidationMode;

#[derive(Clone)]
pub struct AppState {
    pub generator: Arc<Generator>,
    pub cache: Arc<dyn CacheStore>,
    pub versions: Arc<dyn VersionStore>,
    pub history: Arc<dyn HistoryStore>,
    pub default_validation_mode: ValidationMode,
    pub executor_override: Option<String>,
}

impl AppState {
    pub fn from_env() -> Self {
        let storage_path = std::env::var("AQA_STORAGE_PATH").unwrap_or_else(|_| "./.aqa/storage".to_string());
        let cache_enabled = std::env::var("BRAIN_CACHE_ENABLED")
            .map(|v| v != "0" && v.to_ascii_lowercase() != "false")
            .unwrap_or(true);

        let cache: Arc<dyn CacheStore> = Arc::new(
            FileCacheStore::new(format!("{storage_path}/cache"), cache_enabled)
                .expect("cache directory must be creatable"),
        );
        let versions: Arc<dyn VersionStore> = Arc::new(FileVersionStore::new(format!("{storage_path}/versions")));
        let history: Arc<dyn HistoryStore> =
            Arc::from(aqa_storage::build_history_store(std::env::var("AQA_STORAGE_BACKEND").ok().as_deref())
                .expect("history backend must be constructible"));

        let provider = build_provider();
        let generator = Arc::new(Generator::new(provider, cache.clone()));

        let default_validation_mode = match std::env::var("AQA_VALIDATION_MODE").ok().as_deref() {
            Some("strict") => ValidationMode::Strict,
            Some("lenient") => ValidationMode::Lenient,
            _ => ValidationMode::Default,
        };

        AppState {
            generator,
            cache,
            versions,
            history,
            default_validation_mode,
            executor_override: std::env::var("AQA_RUNNER_PATH").ok(),
        }
    }

    pub fn run_options(&self) -> RunOptions {
        let timeout_ms = std::env::var("BRAIN_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30_000);
        RunOptions {
            timeout: std::time::Duration::from_millis(timeout_ms),
            executor_override: self.executor_override.clone(),
            ..Default::default()
        }
    }
}

/// Builds the LLM provider from the `AQA_LLM_MODE`/`BRAIN_*` env table:
/// `mock` forces the deterministic mock, anything else builds a
/// fallback-chained `RealProvider` from whichever of
/// `OPENAI_API_KEY`/`XAI_API_KEY`/`ANTHROPIC_API_KEY` are set.
fn build_provider() -> Arc<dyn Provider> {
    if std::env::var("AQA_LLM_MODE").as_deref() == Ok("mock") {
        return Arc::new(aqa_llm::MockProvider::new(
            r#"{"spec_version":"0.1","meta":{"id":"mock","name":"mock plan","created_at":"1970-01-01T00:00:00Z"},"config":{"base_url":"http://localhost","timeout_ms":5000},"steps":[]}"#,
        ));
    }

    let model = std::env::var("BRAIN_MODEL").unwrap_or_else(|_| "gpt-4".to_string());
    let fallback_enabled = std::env::var("BRAIN_LLM_FALLBACK")
        .map(|v| v != "0" && v.to_ascii_lowercase() != "false")
        .unwrap_or(true);

    let mut backends = Vec::new();
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        backends.push(Backend {
            name: "openai".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: key,
            model: model.clone(),
        });
    }
    if let Ok(key) = std::env::var("XAI_API_KEY") {
        backends.push(Backend {
            name: "xai".to_string(),
            base_url: "https://api.x.ai/v1".to_string(),
            api_key: key,
            model: model.clone(),
        });
    }
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        backends.push(Backend {
            name: "anthropic".to_string(),
            base_url: "https://api.anthropic.com/v1".to_string(),
            api_key: key,
            model: model.clone(),
        });
    }

    if let Ok(preferred) = std::env::var("BRAIN_LLM_PROVIDER") {
        backends.sort_by_key(|b| if b.name == preferred { 0 } else { 1 });
    }

    Arc::new(RealProvider::new(backends, fallback_enabled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_mode_yields_the_mock_provider() {
        std::env::set_var("AQA_LLM_MODE", "mock");
        let provider = build_provider();
        assert_eq!(provider.name(), "mock");
        std::env::remove_var("AQA_LLM_MODE");
    }
}
