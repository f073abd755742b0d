//! Priority tie-break strategies.
//!
//! # Design Decisions
//! - The mode is parsed once at startup; an unknown mode is a config error
//! - `outranks(a, b)` reads "does a beat b"; equality never outranks

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// How two endpoint priorities are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortingMethod {
    /// The larger priority wins.
    #[default]
    Max,
    /// The smaller priority wins.
    Min,
}

/// Raised when the configured sorting mode is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized sorting method '{0}' (expected MAX or MIN)")]
pub struct SortingMethodError(pub String);

impl SortingMethod {
    /// Returns true if `candidate` outranks `existing` under this mode.
    pub fn outranks(self, candidate: i32, existing: i32) -> bool {
        match self {
            SortingMethod::Max => candidate > existing,
            SortingMethod::Min => existing > candidate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortingMethod::Max => "MAX",
            SortingMethod::Min => "MIN",
        }
    }
}

impl FromStr for SortingMethod {
    type Err = SortingMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("max") {
            Ok(SortingMethod::Max)
        } else if trimmed.eq_ignore_ascii_case("min") {
            Ok(SortingMethod::Min)
        } else {
            Err(SortingMethodError(s.to_string()))
        }
    }
}

impl fmt::Display for SortingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
