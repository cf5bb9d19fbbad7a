//! Deterministic keyword-templated provider used in tests and local
//! development without a real back-end configured.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::LlmError;
use crate::provider::{Provider, Request, Response};

#[derive(Debug, Clone)]
pub struct Template {
    pub keyword: String,
    pub text: String,
}

#[derive(Default)]
struct MockState {
    call_count: u64,
    last_prompt: Option<String>,
    fail_next: bool,
}

pub struct MockProvider {
    templates: Vec<Template>,
    default_template: String,
    simulated_latency: Option<Duration>,
    state: Mutex<MockState>,
}

impl MockProvider {
    pub fn new(default_template: impl Into<String>) -> Self {
        MockProvider {
            templates: default_templates(),
            default_template: default_template.into(),
            simulated_latency: None,
            state: Mutex::new(MockState::default()),
        }
    }

    pub fn with_templates(mut self, templates: Vec<Template>) -> Self {
        self.templates = templates;
        self
    }

    pub fn with_simulated_latency(mut self, latency: Duration) -> Self {
        self.simulated_latency = Some(latency);
        self
    }

    /// Arms the next `generate` call to fail with [`LlmError::MockFailure`].
    pub fn fail_next_call(&self) {
        self.state.lock().unwrap().fail_next = true;
    }

    pub fn call_count(&self) -> u64 {
        self.state.lock().unwrap().call_count
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.state.lock().unwrap().last_prompt.clone()
    }

    fn select_template(&self, prompt: &str) -> &str {
        let lower = prompt.to_ascii_lowercase();
        self.templates
            .iter()
            .find(|t| lower.contains(&t.keyword))
            .map(|t| t.text.as_str())
            .unwrap_or(&self.default_template)
    }
}

fn default_templates() -> Vec<Template> {
    vec![
        Template {
            keyword: "login".to_string(),
            text: LOGIN_TEMPLATE.to_string(),
        },
        Template {
            keyword: "crud".to_string(),
            text: CRUD_TEMPLATE.to_string(),
        },
        Template {
            keyword: "health".to_string(),
            text: HEALTH_TEMPLATE.to_string(),
        },
    ]
}

const LOGIN_TEMPLATE: &str = r#"{"spec_version":"0.1","meta":{"id":"mock-login","name":"login flow","created_at":"2024-01-01T00:00:00Z"},"config":{"base_url":"http://localhost","timeout_ms":5000},"steps":[{"id":"login","action":"http_request","params":{"method":"POST","path":"/login"},"assertions":[{"type":"status_code","operator":"eq","value":200}]}]}"#;

const CRUD_TEMPLATE: &str = r#"{"spec_version":"0.1","meta":{"id":"mock-crud","name":"crud flow","created_at":"2024-01-01T00:00:00Z"},"config":{"base_url":"http://localhost","timeout_ms":5000},"steps":[{"id":"create","action":"http_request","params":{"method":"POST","path":"/resource"},"assertions":[{"type":"status_code","operator":"eq","value":201}]},{"id":"read","action":"http_request","depends_on":["create"],"params":{"method":"GET","path":"/resource"},"assertions":[{"type":"status_code","operator":"eq","value":200}]}]}"#;

const HEALTH_TEMPLATE: &str = r#"{"spec_version":"0.1","meta":{"id":"mock-health","name":"health check","created_at":"2024-01-01T00:00:00Z"},"config":{"base_url":"http://localhost","timeout_ms":5000},"steps":[{"id":"health","action":"http_request","params":{"method":"GET","path":"/health"},"assertions":[{"type":"status_code","operator":"eq","value":200}]}]}"#;

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn available(&self) -> bool {
        true
    }

    async fn generate(&self, request: Request) -> Result<Response, LlmError> {
        let start = std::time::Instant::now();

        {
            let mut state = self.state.lock().unwrap();
            state.call_count += 1;
            state.last_prompt = Some(request.prompt.clone());
            if state.fail_next {
                state.fail_next = false;
                return Err(LlmError::MockFailure);
            }
        }

        if let Some(latency) = self.simulated_latency {
            tokio::time::sleep(latency).await;
        }

        let text = self.select_template(&request.prompt).to_string();
        Ok(Response {
            text,
            model: "mock-1".to_string(),
            provider: self.name().to_string(),
            tokens: None,
            latency_ms: start.elapsed().as_millis() as u64,
            metadata: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selects_template_by_keyword() {
        let mock = MockProvider::new("{}");
        let response = mock.generate(Request::new("please generate a login flow")).await.unwrap();
        assert!(response.text.contains("login"));
    }

    #[tokio::test]
    async fn falls_back_to_default_template() {
        let mock = MockProvider::new(r#"{"default": true}"#);
        let response = mock.generate(Request::new("something unrelated")).await.unwrap();
        assert_eq!(response.text, r#"{"default": true}"#);
    }

    #[tokio::test]
    async fn tracks_call_count_and_last_prompt() {
        let mock = MockProvider::new("{}");
        mock.generate(Request::new("first")).await.unwrap();
        mock.generate(Request::new("second")).await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(mock.last_prompt().as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn fail_next_call_fails_exactly_once() {
        let mock = MockProvider::new("{}");
        mock.fail_next_call();
        assert!(mock.generate(Request::new("x")).await.is_err());
        assert!(mock.generate(Request::new("x")).await.is_ok());
    }
}
