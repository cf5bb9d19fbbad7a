use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenApiError {
    #[error("failed to read OpenAPI source file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to fetch OpenAPI source from URL: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to parse OpenAPI document: {0}")]
    Parse(String),
    #[error("OpenAPI document failed strict validation: {0}")]
    Invalid(String),
}
