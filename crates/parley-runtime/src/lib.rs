//! Parley Runtime - process orchestration for a single Parley bot.
//!
//! This crate provides:
//! - Layered process configuration (`parley.toml`, `PARLEY_*` variables)
//! - Logging setup on `tracing-subscriber`
//! - The `.conf`-file [`ConfigProvider`](parley_framework::ConfigProvider)
//!   bots read their own settings from
//! - [`BotRuntime`], which connects, initializes the plugin and runs the
//!   dispatch loop until Ctrl+C / SIGTERM
//!
//! # Feature Flags
//!
//! - `rest-client` (default): [`BotRuntime::run`] over the REST transport
//! - `yaml-config`: accept `parley.yaml`
//! - `json-log`: `logging.format = "json"`

pub mod conf_file;
pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

pub use conf_file::ConfFileProvider;
pub use config::{ConfigError, ConfigLoader, ConfigResult, ParleyConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{BotRuntime, RuntimeBuilder, banner};

// Re-export tracing for use by bot crates
pub use tracing;

/// Logging macros for bot code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
