//! Configuration schema definitions.
//!
//! ```toml
//! [server]
//! site = "https://chat.example.com"
//! email = "helloworld-bot@chat.example.com"
//! api_key = "..."
//!
//! [bot]
//! root_dir = "bots/helloworld"
//!
//! [rate_limit]
//! message_limit = 20
//! interval_secs = 5
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use parley_core::RateLimiter;
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ParleyConfig {
    /// Server connection and credentials.
    #[serde(default)]
    pub server: ServerConfig,

    /// Where the bot keeps its files.
    #[serde(default)]
    pub bot: BotSettings,

    /// Outbound message ceiling.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// File the configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl ParleyConfig {
    /// Human-readable origin for diagnostics.
    pub fn origin(&self) -> String {
        match &self.source {
            Some(path) => path.display().to_string(),
            None => "defaults and environment".to_string(),
        }
    }
}

// =============================================================================
// Server
// =============================================================================

/// Server connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the chat server.
    #[serde(default)]
    pub site: String,

    /// Bot account email.
    #[serde(default)]
    pub email: String,

    /// Bot account API key.
    #[serde(default)]
    pub api_key: String,

    /// Timeout for ordinary requests in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Timeout for one long-poll request in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Pause before retrying a failed long-poll in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl ServerConfig {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Long-poll timeout.
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Retry pause.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            site: String::new(),
            email: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            poll_timeout_secs: default_poll_timeout_secs(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("site", &self.site)
            .field("email", &self.email)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_timeout_secs() -> u64 {
    90
}

fn default_retry_delay_ms() -> u64 {
    1000
}

// =============================================================================
// Bot
// =============================================================================

/// Per-bot filesystem settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Directory the bot may open files in; `<bot>.conf` is looked up here
    /// unless `config_file` is set.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Explicit bot configuration file.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            config_file: None,
        }
    }
}

fn default_root_dir() -> PathBuf {
    PathBuf::from(".")
}

// =============================================================================
// Rate limit
// =============================================================================

/// Outbound message ceiling: at most `message_limit` sends per
/// `interval_secs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl RateLimitConfig {
    /// Builds the limiter.
    pub fn to_limiter(&self) -> RateLimiter {
        RateLimiter::new(self.message_limit, Duration::from_secs(self.interval_secs))
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            message_limit: default_message_limit(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_message_limit() -> usize {
    RateLimiter::DEFAULT_MESSAGE_LIMIT
}

fn default_interval_secs() -> u64 {
    RateLimiter::DEFAULT_INTERVAL_LIMIT.as_secs()
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Lowercase name, as accepted by `EnvFilter` directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    #[cfg(feature = "json-log")]
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-target levels, e.g. `parley_transport = "debug"`.
    #[serde(default)]
    pub filters: BTreeMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Include thread ids in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,
}
