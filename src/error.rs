use std::fmt::{self, Display};
use std::io;

/// Provides `SimError` and maps to other errors to
/// convert to a `SimError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    /// A control value was missing, non-numeric or outside of its domain.
    ConfigError {
        field: String,
        reason: String,
    },
    /// A sample or day index fell outside of the statistics store.
    CapacityExceeded {
        what: &'static str,
        index: usize,
        capacity: usize,
    },
    ScenarioError(String),
    ReportError(String),
    SimError(String),
}

impl SimError {
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::ConfigError {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        SimError::CsvError(error)
    }
}

impl From<String> for SimError {
    fn from(error: String) -> Self {
        SimError::SimError(error)
    }
}

impl From<&str> for SimError {
    fn from(error: &str) -> Self {
        SimError::SimError(error.to_string())
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::IoError(error) => Some(error),
            SimError::JsonError(error) => Some(error),
            SimError::CsvError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::ConfigError { field, reason } => {
                write!(f, "Error: invalid control `{field}`: {reason}")
            }
            SimError::CapacityExceeded {
                what,
                index,
                capacity,
            } => write!(
                f,
                "Error: {what} index {index} exceeds the statistics capacity of {capacity}"
            ),
            SimError::ScenarioError(message)
            | SimError::ReportError(message)
            | SimError::SimError(message) => write!(f, "Error: {message}"),
            other => write!(f, "Error: {other:?}"),
        }
    }
}
