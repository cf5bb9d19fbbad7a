//! OpenAPI v2/v3 ingestion and deterministic case derivation.

pub mod derivation;
pub mod error;
pub mod ingestion;
pub mod types;

pub use derivation::{derive_negative_cases, derive_robustness_cases, inject_latency_assertions, DerivationOptions};
pub use error::OpenApiError;
pub use ingestion::{parse_openapi, spec_to_requirement_text, Source};
pub use types::{Endpoint, FieldSchema, JsonType, ParamInfo, ParamLocation, RequestBodyInfo, Spec};
