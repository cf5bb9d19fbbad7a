//! The LLM Provider Layer: a small `Provider` trait with mock and
//! real (OpenAI-compatible, fallback-chained) implementations.

pub mod error;
pub mod mock;
pub mod provider;
pub mod real;

pub use error::LlmError;
pub use mock::{MockProvider, Template};
pub use provider::{Provider, Request, Response};
pub use real::{Backend, RealProvider};
