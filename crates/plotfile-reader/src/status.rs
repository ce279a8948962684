//! Severity classes and caller-defined status codes.

use serde::{Deserialize, Serialize};

/// Code reported for every severity until the caller registers its own.
///
/// Chosen so it cannot collide with the 0 / positive / negative conventions
/// callers normally use.
pub const UNCONFIGURED_STATUS: i32 = i32::MIN;

/// Outcome class of a load or extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Full success.
    NoError,
    /// Partial success: the request reached outside the dataset.
    Severe,
    /// The operation aborted.
    Fatal,
}

impl Severity {
    /// Lower-case name, as used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoError => "no_error",
            Self::Severe => "severe",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three integers a caller uses for no-error / severe / fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCodes {
    pub no_error: i32,
    pub severe: i32,
    pub fatal: i32,
}

impl StatusCodes {
    pub fn new(no_error: i32, severe: i32, fatal: i32) -> Self {
        Self {
            no_error,
            severe,
            fatal,
        }
    }

    /// Code registered for `severity`.
    pub fn code(&self, severity: Severity) -> i32 {
        match severity {
            Severity::NoError => self.no_error,
            Severity::Severe => self.severe,
            Severity::Fatal => self.fatal,
        }
    }
}
