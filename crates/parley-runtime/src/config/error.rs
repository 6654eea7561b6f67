//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested file does not exist.
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// A source could not be parsed or did not match the schema.
    #[error("failed to load configuration: {0}")]
    Parse(#[source] Box<figment::Error>),

    /// The configuration parsed but is unusable.
    #[error("invalid configuration in {origin}: {message}")]
    Invalid {
        /// File (or "defaults and environment") the values came from.
        origin: String,
        /// What is wrong.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn invalid(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            origin: origin.into(),
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Parse(Box::new(error))
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
