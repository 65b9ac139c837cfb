//! Error types for the environment abstraction.

use thiserror::Error;

/// Errors that can occur in the environment abstraction layer.
#[derive(Debug, Error)]
pub enum EnvError {
    /// The clock returned an unusable value
    #[error("Clock error: {0}")]
    ClockError(String),
    
    /// A run identifier could not be parsed
    #[error("Invalid run id: {0}")]
    InvalidRunId(String),
}

impl EnvError {
    /// Creates a clock error.
    pub fn clock(msg: impl Into<String>) -> Self {
        Self::ClockError(msg.into())
    }
}
