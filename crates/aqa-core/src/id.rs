//! Stable identifier newtypes for plan entities.
//!
//! Step IDs are user-chosen strings (not generated indices), so `StepId`
//! wraps `String` rather than an integer -- unlike a graph index, two
//! different steps can never collide on id by construction alone; the
//! validator is what enforces uniqueness (see `aqa-validate`).

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier for a [`crate::Step`] within a [`crate::Plan`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(pub String);

impl StepId {
    pub fn new(s: impl Into<String>) -> Self {
        StepId(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StepId {
    fn from(s: &str) -> Self {
        StepId(s.to_string())
    }
}

impl From<String> for StepId {
    fn from(s: String) -> Self {
        StepId(s)
    }
}

impl Borrow<str> for StepId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_inner() {
        assert_eq!(format!("{}", StepId::new("a")), "a");
    }

    #[test]
    fn serde_roundtrip() {
        let id = StepId::new("login_step");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"login_step\"");
        let back: StepId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
