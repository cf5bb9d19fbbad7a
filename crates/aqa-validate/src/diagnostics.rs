//! Structured diagnostics with JSON-pointer locations and fix suggestions.
//!
//! Carries enough context for a caller to act on a failure without
//! re-querying: a stable code, a human message, the JSON-pointer path, and
//! an optional suggested fix.

use serde::{Deserialize, Serialize};

use crate::codes::{Category, Code, Severity};

/// A single validation diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: Code,
    pub message: String,
    pub severity: Severity,
    /// JSON pointer to the offending location, e.g. `/steps/1/depends_on/0`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl Diagnostic {
    pub fn new(code: Code, message: impl Into<String>) -> Self {
        Diagnostic {
            code,
            message: message.into(),
            severity: Severity::Error,
            pointer: None,
            suggestion: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.pointer = Some(pointer.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn category(&self) -> Category {
        self.code.category()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(p) = &self.pointer {
            write!(f, " ({p})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn builder_chain_sets_all_fields() {
        let d = Diagnostic::new(codes::CYCLE_DETECTED, "cycle")
            .with_severity(Severity::Warning)
            .with_pointer("/steps")
            .with_suggestion("remove the edge");
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.pointer.as_deref(), Some("/steps"));
        assert!(!d.is_error());
    }

    #[test]
    fn display_includes_pointer_when_present() {
        let d = Diagnostic::new(codes::DUPLICATE_STEP_ID, "dup").with_pointer("/steps/0/id");
        assert_eq!(format!("{d}"), "E1002: dup (/steps/0/id)");
    }
}
