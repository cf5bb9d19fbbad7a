use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error("E4001 executor binary not found; tried: {0:?}")]
    ExecutorNotFound(Vec<String>),

    #[error("E5002 executor invocation timed out after {0}ms")]
    Timeout(u64),

    #[error("E5001 executor report was not valid JSON: {message}; raw payload follows: {raw}")]
    UnparseableReport { message: String, raw: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Storage(#[from] aqa_storage::StorageError),

    #[error("executor exited without producing a report (status: {0})")]
    NoReport(String),
}
