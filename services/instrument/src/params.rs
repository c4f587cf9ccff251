//! Request parameter types for the `/run` endpoint

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_TIMEOUT_SECS: i64 = 1;
pub const MAX_TIMEOUT_SECS: i64 = 3600;
pub const DEFAULT_TIMEOUT_SECS: i64 = 300;

fn default_timeout() -> i64 {
    DEFAULT_TIMEOUT_SECS
}

/// Body of `POST /run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// Shell command, passed verbatim to the shell
    pub command: String,

    /// Timeout in seconds, 1..=3600
    #[serde(default = "default_timeout")]
    pub timeout: i64,
}

impl RunRequest {
    pub fn new(command: impl Into<String>, timeout: i64) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// Check the timeout bounds and convert to a `Duration`
    pub fn validate(&self) -> Result<Duration, ValidationError> {
        if !(MIN_TIMEOUT_SECS..=MAX_TIMEOUT_SECS).contains(&self.timeout) {
            return Err(ValidationError::TimeoutOutOfRange {
                value: self.timeout,
                min: MIN_TIMEOUT_SECS,
                max: MAX_TIMEOUT_SECS,
            });
        }
        // Bounds checked above, so the value is positive.
        Ok(Duration::from_secs(self.timeout.unsigned_abs()))
    }
}

/// Request rejected before any process is spawned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("timeout must be between {min} and {max} seconds, got {value}")]
    TimeoutOutOfRange { value: i64, min: i64, max: i64 },

    /// The body could not be decoded into a [`RunRequest`]
    #[error("{message}")]
    Body { status: u16, message: String },
}
