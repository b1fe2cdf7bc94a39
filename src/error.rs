use std::time::Duration;
use thiserror::Error;

/// One endpoint, one try, failed. Always retryable within the current race.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Endpoint returned status {0}")]
    Status(u16),

    #[error("Malformed payload: {0}")]
    Payload(String),

    #[error("Rejected by endpoint: {0}")]
    Rejected(String),
}

/// Every endpoint failed within one round.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("All {endpoints_tried} endpoints failed{}", last_cause_suffix(.last))]
pub struct AggregateError {
    pub endpoints_tried: usize,
    pub last: Option<AttemptError>,
}

fn last_cause_suffix(last: &Option<AttemptError>) -> String {
    match last {
        Some(e) => format!(" (last: {})", e),
        None => String::new(),
    }
}

#[derive(Error, Debug, Clone)]
pub enum WaystoneError {
    #[error("Gave up after {attempts} attempts: {cause}")]
    Exhausted {
        attempts: u32,
        cause: AggregateError,
    },

    #[error("Missing precondition: {0}")]
    MissingPrecondition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport setup error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

pub type Result<T> = std::result::Result<T, WaystoneError>;

impl From<std::io::Error> for WaystoneError {
    fn from(e: std::io::Error) -> Self {
        WaystoneError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for WaystoneError {
    fn from(e: serde_json::Error) -> Self {
        WaystoneError::Json(e.to_string())
    }
}

impl WaystoneError {
    /// True when the retry budget was spent without a successful round.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, WaystoneError::Exhausted { .. })
    }

    /// Number of rounds run before giving up, if this is a terminal failure.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            WaystoneError::Exhausted { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }
}
