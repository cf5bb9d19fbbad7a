//! The Generator: renders prompts, checks the Plan Cache, calls an
//! LLM provider, extracts and validates JSON, and self-corrects within a
//! bounded number of attempts.

mod error;
mod extraction;
mod generator;
mod prompts;

pub use error::GenerateError;
pub use extraction::extract_json;
pub use generator::{
    Generator, GenerationMetadata, GenerationResult, GeneratorOptions,
    DEFAULT_MAX_CORRECTION_ATTEMPTS, MAX_CORRECTION_ATTEMPTS,
};
