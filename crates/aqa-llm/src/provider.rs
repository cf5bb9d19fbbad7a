//! The LLM provider interface, shared by the [`crate::mock::MockProvider`]
//! and [`crate::real::RealProvider`] implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// A single completion request, with the tunables the Generator
/// needs control over.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub extra: HashMap<String, String>,
}

impl Request {
    pub fn new(prompt: impl Into<String>) -> Self {
        Request {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: 0.2,
            max_tokens: 2048,
            extra: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    pub model: String,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
    pub latency_ms: u64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Stateless-between-calls completion back-end (bookkeeping such as
/// fallback ordering and call counts is the implementation's own state, not
/// part of the contract).
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;
    fn available(&self) -> bool;
    async fn generate(&self, request: Request) -> Result<Response, LlmError>;
}
