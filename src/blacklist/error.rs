//! Blacklist error types.

use thiserror::Error;

/// Errors raised while configuring a blacklist.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BlacklistError {
    /// The sweep interval must be strictly positive
    #[error("sweep interval must be greater than zero")]
    InvalidInterval,

    /// A configuration value could not be parsed
    #[error("invalid value for {name}: {value:?}")]
    InvalidConfig { name: &'static str, value: String },
}

/// Result type for blacklist construction and configuration.
pub type BlacklistResult<T> = Result<T, BlacklistError>;
