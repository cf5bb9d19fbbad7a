//! Core errors produced by the plan model itself (field-level construction
//! failures). Cross-entity rules (DAG acyclicity, reference integrity) are
//! the validator's concern, not the model's -- see `aqa-validate`.

use thiserror::Error;

/// Errors raised while constructing a [`crate::Plan`] or its parts.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("step id must not be empty")]
    EmptyStepId,

    #[error("plan name must not be empty")]
    EmptyPlanName,

    #[error("timeout_ms must be >= 100, got {0}")]
    TimeoutTooLow(u64),

    #[error("max_attempts must be in [1, 10], got {0}")]
    MaxAttemptsOutOfRange(u32),

    #[error("backoff_factor must be >= 1.0, got {0}")]
    BackoffFactorTooLow(f64),

    #[error("unsupported spec_version: {0} (only \"0.1\" is accepted)")]
    UnsupportedSpecVersion(String),
}
