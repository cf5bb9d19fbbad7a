//! Validator and Format Adapter for UTDL plans.

pub mod adapter;
pub mod codes;
pub mod dag;
pub mod diagnostics;
pub mod limits;
pub mod modes;
pub mod validator;

pub use adapter::{adapt, AdaptResult};
pub use codes::{Category, Code, Severity};
pub use diagnostics::Diagnostic;
pub use limits::ExecutionLimits;
pub use modes::ValidationMode;
pub use validator::{PlanStats, ValidationResult, Validator};
