//! Validation strictness modes.

use serde::{Deserialize, Serialize};

/// Controls how diagnostics are promoted/demoted before being returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// Every warning is promoted to an error; only flawless plans pass.
    Strict,
    /// Errors block, warnings are surfaced. The default.
    #[default]
    Default,
    /// A small whitelist of non-critical conditions (unknown dependency
    /// references, non-standard `action` values, empty-step plans) is
    /// demoted from error to warning.
    Lenient,
}
