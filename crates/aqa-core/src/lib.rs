//! The UTDL plan model: a passive, strongly-typed record set.
//!
//! Construction succeeds only if per-field constraints hold (types, ranges,
//! enums). Cross-entity constraints -- DAG acyclicity, `depends_on`
//! reference integrity, uniqueness of step ids -- belong to the validator
//! (`aqa-validate`), not to this crate.

pub mod error;
pub mod id;
pub mod plan;
pub mod value;

pub use error::CoreError;
pub use id::StepId;
pub use plan::{
    Assertion, AssertionType, Config, Extraction, ExtractionSource, Meta, Operator, Plan,
    RecoveryPolicy, RecoveryStrategy, Step, KNOWN_ACTIONS, SPEC_VERSION,
};
pub use value::Value;
