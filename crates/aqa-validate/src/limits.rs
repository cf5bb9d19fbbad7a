//! Execution limit configuration, checked by the validator as structural
//! diagnostics and read from environment variables (`BRAIN_TIMEOUT`,
//! `BRAIN_MAX_STEPS`, `BRAIN_MAX_STEP_RETRIES`), echoing the sibling Rust
//! executor's own `limits::ExecutionLimits`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLimits {
    pub max_steps: usize,
    pub max_parallelism_hint: usize,
    pub retry_budget: u32,
    pub execution_deadline_ms: u64,
    pub step_timeout_ms: u64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_steps: 200,
            max_parallelism_hint: 16,
            retry_budget: 50,
            execution_deadline_ms: 300_000,
            step_timeout_ms: 30_000,
        }
    }
}

impl ExecutionLimits {
    pub fn from_env() -> Self {
        let mut limits = ExecutionLimits::default();
        if let Ok(v) = std::env::var("BRAIN_MAX_STEPS") {
            if let Ok(n) = v.parse() {
                limits.max_steps = n;
            }
        }
        if let Ok(v) = std::env::var("BRAIN_MAX_STEP_RETRIES") {
            if let Ok(n) = v.parse() {
                limits.retry_budget = n;
            }
        }
        if let Ok(v) = std::env::var("BRAIN_TIMEOUT") {
            if let Ok(n) = v.parse::<u64>() {
                limits.execution_deadline_ms = n * 1000;
            }
        }
        limits
    }
}
