//! Runtime error types.

use parley_core::ApiError;
use parley_framework::{DispatchError, HandlerError};
use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a bot process.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Process configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The chat client could not be created.
    #[error("failed to set up chat client: {0}")]
    Transport(#[from] ApiError),

    /// The bot facade could not be built.
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// The dispatch loop ended with an error.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
