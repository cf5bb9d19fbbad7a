use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("E6004 generator provider failure: {0}")]
    Provider(String),

    #[error("E6001 generator exhausted {attempts} correction attempt(s); last diagnostics: {last_diagnostics}")]
    ExhaustedRetries { attempts: u32, last_diagnostics: String },

    #[error("storage error: {0}")]
    Storage(#[from] aqa_storage::StorageError),

    #[error("core error: {0}")]
    Core(#[from] aqa_core::CoreError),
}
