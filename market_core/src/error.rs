//! Error taxonomy for the simulation core.
//!
//! Only [`SeedError`] and [`ConfigError`] are meant to reach a caller. A
//! [`ModelError`] is caught at the orchestrator boundary and turned into
//! execution metadata on the result.

use thiserror::Error;

/// Seed validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedError {
    #[error("Seed {0} is outside the 32-bit range")]
    OutOfRange(u64),
    
    #[error("Seed 0 is not a usable seed")]
    Zero,
    
    #[error("Seed {seed} has low digit diversity ({distinct} distinct digits)")]
    LowDiversity { seed: u32, distinct: usize },
    
    #[error("Seed {0} matches a sequential pattern")]
    SequentialPattern(u32),
    
    #[error("Seed clock error: {0}")]
    Clock(String),
}

/// Scenario configuration errors. These fail fast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),
    
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Creates a missing-field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingField(field.into())
    }
    
    /// Creates an invalid-value error.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors raised inside an individual behavioral model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid input for {model}: {reason}")]
    InvalidInput { model: &'static str, reason: String },
    
    #[error("Missing input for {model}: {what}")]
    MissingInput { model: &'static str, what: String },
}

impl ModelError {
    /// Creates an invalid-input error for the named model.
    pub fn invalid(model: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            model,
            reason: reason.into(),
        }
    }
    
    /// Creates a missing-input error for the named model.
    pub fn missing(model: &'static str, what: impl Into<String>) -> Self {
        Self::MissingInput {
            model,
            what: what.into(),
        }
    }
}
