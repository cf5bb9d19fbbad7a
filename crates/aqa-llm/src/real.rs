//! OpenAI-compatible chat-completions back-end with an ordered fallback
//! chain.

use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::LlmError;
use crate::provider::{Provider, Request, Response};

#[derive(Debug, Clone)]
pub struct Backend {
    pub name: String,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Backend {
    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

pub struct RealProvider {
    backends: Vec<Backend>,
    fallback_enabled: bool,
    client: reqwest::Client,
    last_successful: Mutex<Option<String>>,
}

impl RealProvider {
    /// `backends` is tried in order; when `fallback_enabled` is false only
    /// the first backend is attempted.
    pub fn new(backends: Vec<Backend>, fallback_enabled: bool) -> Self {
        RealProvider {
            backends,
            fallback_enabled,
            client: reqwest::Client::new(),
            last_successful: Mutex::new(None),
        }
    }

    /// The backend name that most recently succeeded, if any.
    pub fn last_successful_backend(&self) -> Option<String> {
        self.last_successful.lock().unwrap().clone()
    }

    async fn call(&self, backend: &Backend, request: &Request) -> Result<Response, LlmError> {
        let start = std::time::Instant::now();
        let mut messages = Vec::new();
        if let Some(system_prompt) = &request.system_prompt {
            messages.push(serde_json::json!({"role": "system", "content": system_prompt}));
        }
        messages.push(serde_json::json!({"role": "user", "content": request.prompt}));

        let body = serde_json::json!({
            "model": backend.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        });

        let resp = self
            .client
            .post(backend.endpoint())
            .header("Authorization", format!("Bearer {}", backend.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::BackendFailed(backend.name.clone(), e.to_string()))?;

        let status = resp.status();
        let body_text = resp
            .text()
            .await
            .map_err(|e| LlmError::BackendFailed(backend.name.clone(), e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::BackendFailed(
                backend.name.clone(),
                format!("HTTP {status}: {body_text}"),
            ));
        }

        let parsed: ChatCompletion = serde_json::from_str(&body_text)
            .map_err(|e| LlmError::BackendFailed(backend.name.clone(), e.to_string()))?;

        let text = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| LlmError::EmptyResponse(backend.name.clone()))?;

        Ok(Response {
            text,
            model: backend.model.clone(),
            provider: backend.name.clone(),
            tokens: parsed.usage.map(|u| u.total_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
            metadata: Default::default(),
        })
    }
}

#[async_trait]
impl Provider for RealProvider {
    fn name(&self) -> &str {
        "real"
    }

    fn available(&self) -> bool {
        !self.backends.is_empty()
    }

    async fn generate(&self, request: Request) -> Result<Response, LlmError> {
        if self.backends.is_empty() {
            return Err(LlmError::NotConfigured);
        }

        let mut attempts = Vec::new();
        for backend in &self.backends {
            match self.call(backend, &request).await {
                Ok(response) => {
                    *self.last_successful.lock().unwrap() = Some(backend.name.clone());
                    return Ok(response);
                }
                Err(e) => {
                    attempts.push(format!("{}: {}", backend.name, e));
                    if !self.fallback_enabled {
                        break;
                    }
                }
            }
        }

        Err(LlmError::AllBackendsFailed(attempts.join("; ")))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_backends_is_unavailable() {
        let provider = RealProvider::new(vec![], true);
        assert!(!provider.available());
    }

    #[tokio::test]
    async fn generate_without_backends_is_not_configured() {
        let provider = RealProvider::new(vec![], true);
        let err = provider.generate(Request::new("x")).await.unwrap_err();
        assert!(matches!(err, LlmError::NotConfigured));
    }
}
