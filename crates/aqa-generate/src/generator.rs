//! The Generator: prompt assembly, cache lookup, and a bounded
//! self-correction loop that re-prompts with the validator's diagnostics
//! embedded until the plan is accepted or the attempt budget is spent.

use std::sync::Arc;
use std::time::Instant;

use aqa_core::Plan;
use aqa_llm::{Provider, Request};
use aqa_storage::CacheStore;
use aqa_validate::{ValidationMode, Validator};

use crate::error::GenerateError;
use crate::extraction::extract_json;
use crate::prompts::{correction_prompt, system_prompt, user_prompt};

/// Default/maximum bounds for the self-correction loop.
pub const DEFAULT_MAX_CORRECTION_ATTEMPTS: u32 = 3;
pub const MAX_CORRECTION_ATTEMPTS: u32 = 10;

/// Metadata about how a plan was produced, surfaced to callers alongside
/// the plan itself: "publish generation metadata").
#[derive(Debug, Clone)]
pub struct GenerationMetadata {
    pub provider: String,
    pub model: String,
    pub tokens: Option<u32>,
    pub cached: bool,
    pub elapsed_ms: u64,
    pub attempts: u32,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub plan: Plan,
    pub metadata: GenerationMetadata,
}

pub struct GeneratorOptions {
    pub skip_cache: bool,
    pub max_correction_attempts: u32,
    pub validation_mode: ValidationMode,
    pub model: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        GeneratorOptions {
            skip_cache: false,
            max_correction_attempts: DEFAULT_MAX_CORRECTION_ATTEMPTS,
            validation_mode: ValidationMode::Default,
            model: "gpt-4".to_string(),
        }
    }
}

pub struct Generator {
    provider: Arc<dyn Provider>,
    cache: Arc<dyn CacheStore>,
}

impl Generator {
    pub fn new(provider: Arc<dyn Provider>, cache: Arc<dyn CacheStore>) -> Self {
        Generator { provider, cache }
    }

    /// `generate(requirement, base_url, skip_cache?) -> Plan`.
    pub async fn generate(
        &self,
        requirement: &str,
        base_url: &str,
        options: &GeneratorOptions,
    ) -> Result<GenerationResult, GenerateError> {
        let started = Instant::now();
        let max_attempts = options.max_correction_attempts.clamp(1, MAX_CORRECTION_ATTEMPTS);

        if !options.skip_cache {
            if let Some(plan) = self.cache.get(
                requirement,
                base_url,
                Some(self.provider.name()),
                Some(&options.model),
            )? {
                return Ok(GenerationResult {
                    plan,
                    metadata: GenerationMetadata {
                        provider: self.provider.name().to_string(),
                        model: options.model.clone(),
                        tokens: None,
                        cached: true,
                        elapsed_ms: started.elapsed().as_millis() as u64,
                        attempts: 0,
                    },
                });
            }
        }

        let validator = Validator::new(options.validation_mode);
        let mut raw_json = self.call(user_prompt(requirement, base_url)).await?;
        let mut last_diagnostics = String::new();
        let mut tokens_used = None;
        let mut attempts_taken = 0;

        for attempt in 0..max_attempts {
            attempts_taken = attempt + 1;
            let extracted = extract_json(&raw_json.text);
            tokens_used = raw_json.tokens;
            let result = validator.validate_json(&extracted);

            if result.ok {
                if let Some(plan) = result.plan {
                    let hash = self.cache.store(
                        requirement,
                        base_url,
                        &plan,
                        Some(self.provider.name()),
                        Some(&options.model),
                    )?;
                    tracing::info!(
                        plan_hash = %hash,
                        attempts = attempts_taken,
                        "generator produced a valid plan"
                    );
                    return Ok(GenerationResult {
                        plan,
                        metadata: GenerationMetadata {
                            provider: self.provider.name().to_string(),
                            model: options.model.clone(),
                            tokens: tokens_used,
                            cached: false,
                            elapsed_ms: started.elapsed().as_millis() as u64,
                            attempts: attempts_taken,
                        },
                    });
                }
            }

            last_diagnostics = render_diagnostics(&result.errors.iter().map(|d| d.to_string()).collect::<Vec<_>>());
            if attempt + 1 >= max_attempts {
                break;
            }
            raw_json = self.call(correction_prompt(&last_diagnostics, &extracted)).await?;
        }

        Err(GenerateError::ExhaustedRetries {
            attempts: attempts_taken,
            last_diagnostics,
        })
    }

    async fn call(&self, prompt: String) -> Result<aqa_llm::Response, GenerateError> {
        let request = Request {
            system_prompt: Some(system_prompt()),
            ..Request::new(prompt)
        };
        self.provider
            .generate(request)
            .await
            .map_err(|e| GenerateError::Provider(e.to_string()))
    }
}

fn render_diagnostics(lines: &[String]) -> String {
    if lines.is_empty() {
        "(validator produced no specific errors)".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aqa_llm::MockProvider;
    use aqa_storage::FileCacheStore;
    use std::sync::Arc;

    fn sample_plan_json() -> &'static str {
        r#"{
            "spec_version": "0.1",
            "meta": {"id": "p1", "name": "login flow", "created_at": "2024-01-01T00:00:00Z"},
            "config": {"base_url": "http://h", "timeout_ms": 1000},
            "steps": [{"id": "login", "action": "http_request", "params": {"method": "POST", "path": "/login"},
                       "assertions": [{"type": "status_code", "operator": "eq", "value": 200}]}]
        }"#
    }

    #[tokio::test]
    async fn generates_and_caches_a_valid_plan() {
        let provider = Arc::new(
            MockProvider::new(sample_plan_json()).with_templates(vec![]),
        );
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCacheStore::new(tmp.path(), true).unwrap());
        let generator = Generator::new(provider.clone(), cache.clone());

        let result = generator
            .generate("test login", "http://h", &GeneratorOptions::default())
            .await
            .unwrap();

        assert_eq!(result.plan.steps.len(), 1);
        assert!(!result.metadata.cached);
        assert_eq!(provider.call_count(), 1);

        let second = generator
            .generate("test login", "http://h", &GeneratorOptions::default())
            .await
            .unwrap();
        assert!(second.metadata.cached);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn self_corrects_after_an_invalid_first_attempt() {
        let provider = Arc::new(MockProvider::new("not json at all").with_templates(vec![]));
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCacheStore::new(tmp.path(), true).unwrap());

        // First call returns garbage (via default_template), forcing a
        // correction round; MockProvider has no keyword match so every
        // call returns the same default_template, which never validates --
        // exercise the bound instead of a realistic correction.
        let generator = Generator::new(provider, cache);
        let options = GeneratorOptions {
            max_correction_attempts: 2,
            ..Default::default()
        };
        let err = generator.generate("req", "http://h", &options).await.unwrap_err();
        match err {
            GenerateError::ExhaustedRetries { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn skip_cache_always_calls_the_provider() {
        let provider = Arc::new(MockProvider::new(sample_plan_json()).with_templates(vec![]));
        let tmp = tempfile::tempdir().unwrap();
        let cache = Arc::new(FileCacheStore::new(tmp.path(), true).unwrap());
        let generator = Generator::new(provider.clone(), cache);

        let options = GeneratorOptions { skip_cache: true, ..Default::default() };
        generator.generate("req", "http://h", &options).await.unwrap();
        generator.generate("req", "http://h", &options).await.unwrap();
        assert_eq!(provider.call_count(), 2);
    }
}
