//! Configuration for the Parley runtime.
//!
//! Settings are layered with figment: built-in defaults, then `parley.toml`
//! (or an explicit file), then `PARLEY_*` environment variables. See
//! [`ConfigLoader`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, load_config, load_config_from_file};
pub use schema::{
    BotSettings, LogFormat, LogLevel, LogOutput, LoggingConfig, ParleyConfig, RateLimitConfig,
    ServerConfig, SpanEventConfig,
};
pub use validation::validate_config;
