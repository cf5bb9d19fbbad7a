//! Structured diagnostic codes, `E1xxx`-`E6xxx`, carrying category and
//! default severity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// First digit of a diagnostic code selects its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// E1xxx -- structural/semantic validation.
    Validation,
    /// E2xxx -- HTTP/network (executor side, surfaced here only when
    /// echoed back from an execution report).
    Http,
    /// E3xxx -- assertion failures (executor side).
    Assertion,
    /// E4xxx -- configuration/environment.
    Configuration,
    /// E5xxx -- internal errors.
    Internal,
    /// E6xxx -- generator/control-plane specific.
    Generator,
}

impl Category {
    fn digit(self) -> u32 {
        match self {
            Category::Validation => 1,
            Category::Http => 2,
            Category::Assertion => 3,
            Category::Configuration => 4,
            Category::Internal => 5,
            Category::Generator => 6,
        }
    }

    fn from_digit(d: u32) -> Category {
        match d {
            1 => Category::Validation,
            2 => Category::Http,
            3 => Category::Assertion,
            4 => Category::Configuration,
            5 => Category::Internal,
            _ => Category::Generator,
        }
    }
}

/// Severity of a diagnostic. `strict` mode promotes every `Warning` to
/// `Error` before diagnostics are returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// A stable, numeric error code in the `E1xxx`-`E6xxx` space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code(pub u32);

impl Code {
    pub fn category(self) -> Category {
        Category::from_digit(self.0 / 1000)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.0)
    }
}

macro_rules! codes {
    ($($name:ident = $num:expr),+ $(,)?) => {
        $(pub const $name: Code = Code($num);)+
    };
}

codes! {
    UNSUPPORTED_SPEC_VERSION = 1001,
    DUPLICATE_STEP_ID = 1002,
    UNKNOWN_DEPENDENCY = 1003,
    SELF_DEPENDENCY = 1004,
    CYCLE_DETECTED = 1005,
    UNKNOWN_ACTION = 1006,
    EMPTY_PLAN = 1007,
    SHAPE_ERROR = 1008,
    UNSUPPORTED_ROOT_KEY = 1009,
    EMPTY_STEP_ID = 1010,

    EXCEEDS_MAX_STEPS = 1101,
    EXCEEDS_MAX_PARALLELISM = 1102,
    EXCEEDS_RETRY_BUDGET = 1103,
    EXCEEDS_EXECUTION_DEADLINE = 1104,
    EXCEEDS_STEP_TIMEOUT = 1105,

    ADAPTER_NO_STEPS = 6002,
    GENERATOR_EXHAUSTED_RETRIES = 6001,
    GENERATOR_PROVIDER_FAILURE = 6004,
    GENERATOR_EXTRACTION_FAILED = 6005,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_from_code() {
        assert_eq!(CYCLE_DETECTED.category(), Category::Validation);
        assert_eq!(ADAPTER_NO_STEPS.category(), Category::Generator);
    }

    #[test]
    fn formats_with_leading_e_and_zero_pad() {
        assert_eq!(format!("{}", Code(7)), "E0007");
        assert_eq!(format!("{}", CYCLE_DETECTED), "E1005");
    }
}
