use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("no LLM back-end is configured")]
    NotConfigured,
    #[error("back-end '{0}' request failed: {1}")]
    BackendFailed(String, String),
    #[error("back-end '{0}' returned a response with no content")]
    EmptyResponse(String),
    #[error("all configured back-ends failed: {0}")]
    AllBackendsFailed(String),
    #[error("mock provider was armed to fail this call")]
    MockFailure,
}
