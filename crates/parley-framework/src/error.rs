//! Error types for the Parley framework.

use std::path::PathBuf;

use parley_core::ApiError;
use thiserror::Error;

use crate::plugin::Capability;

// =============================================================================
// State Errors
// =============================================================================

/// Errors raised by the [`StateStore`](crate::state::StateStore).
#[derive(Debug, Error)]
pub enum StateError {
    /// The initial storage fetch failed.
    #[error("error initializing state: {0}")]
    Initialization(#[source] ApiError),

    /// The server rejected a flush; the dirty set is left intact.
    #[error("error updating state: {0}")]
    Sync(#[source] ApiError),

    /// No entry is stored under the key.
    #[error("no state stored under key '{0}'")]
    KeyNotFound(String),

    /// The value could not be encoded.
    #[error("failed to serialize state value for key '{key}': {source}")]
    Serialize {
        /// Key being written.
        key: String,
        /// Underlying codec error.
        #[source]
        source: serde_json::Error,
    },

    /// The stored text could not be decoded into the requested type.
    #[error("failed to deserialize state value for key '{key}': {source}")]
    Deserialize {
        /// Key being read.
        key: String,
        /// Underlying codec error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for state operations.
pub type StateResult<T> = Result<T, StateError>;

// =============================================================================
// Bot Config Errors
// =============================================================================

/// Errors raised while reading a bot's configuration section.
#[derive(Debug, Error)]
pub enum BotConfigError {
    /// No configuration source was supplied for this bot.
    #[error("no bot configuration file was supplied")]
    NotConfigured,

    /// The backing file does not exist.
    #[error("bot configuration file not found: {}", path.display())]
    NotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but has no section for the bot.
    #[error("bot configuration file {} has no [{section}] section", path.display())]
    MissingSection {
        /// Path of the file.
        path: PathBuf,
        /// Section that was requested.
        section: String,
    },

    /// The file could not be read or parsed.
    #[error("failed to read bot configuration file {}: {message}", path.display())]
    Invalid {
        /// Path of the file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

impl BotConfigError {
    /// Returns `true` when the file itself is absent, which an optional
    /// lookup tolerates.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::NotConfigured | Self::NotFound { .. })
    }
}

// =============================================================================
// Handler Errors
// =============================================================================

/// Errors surfaced by the [`BotHandler`](crate::handler::BotHandler) facade.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The bot's identity could not be resolved at startup.
    #[error("cannot fetch bot profile ({0}); is the server running and the site URL correct?")]
    Initialization(#[source] ApiError),

    /// The plugin used a feature it did not declare.
    #[error(
        "bot tried to access {capability}, but has not declared it; add \
         `Capability::{capability:?}` to the capabilities of its plugin descriptor"
    )]
    Capability {
        /// The undeclared capability.
        capability: Capability,
    },

    /// A file path resolved outside the bot's root directory.
    #[error(
        "cannot open file \"{}\": bots may only access files in their local directory",
        path.display()
    )]
    Permission {
        /// The offending path after resolution.
        path: PathBuf,
    },

    /// The outbound rate ceiling was hit; the bot must stop.
    #[error(
        "message rate limit reached; is the bot trapped in an infinite loop by reacting to \
         its own messages?"
    )]
    RateLimitExceeded,

    /// A configuration section could not be read.
    #[error(transparent)]
    Config(#[from] BotConfigError),

    /// Local I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The chat service rejected a call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Storage failed.
    #[error(transparent)]
    State(#[from] StateError),
}

impl HandlerError {
    /// Returns `true` for errors that must stop the bot.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Initialization(_)
                | Self::Capability { .. }
                | Self::RateLimitExceeded
                | Self::State(StateError::Sync(_))
        )
    }
}

/// Result type for facade operations.
pub type HandlerResult<T> = Result<T, HandlerError>;

// =============================================================================
// Dispatch Errors
// =============================================================================

/// Errors that end the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The event feed failed permanently.
    #[error("event feed failed: {0}")]
    Feed(#[source] ApiError),

    /// Flushing state after an event failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// The plugin hit a fatal facade error.
    #[error("fatal bot error: {0}")]
    Fatal(#[source] HandlerError),

    /// The plugin's `initialize` hook failed.
    #[error("plugin '{plugin}' failed to initialize: {message}")]
    Initialize {
        /// Plugin name.
        plugin: String,
        /// Error reported by the hook.
        message: String,
    },
}

/// Result type for the dispatch loop.
pub type DispatchResult<T> = Result<T, DispatchError>;
