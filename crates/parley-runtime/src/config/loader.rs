//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Programmatic overrides ([`ConfigLoader::merge`])
//! 3. Config file: an explicit [`file`](ConfigLoader::file), or the first
//!    `parley.toml` found in the search paths (current directory, then
//!    `<user config dir>/parley`)
//! 4. Environment variables (`PARLEY_*`)
//!
//! # Feature Flags
//!
//! - `yaml-config`: also accept `parley.yaml` / `parley.yml`
//!
//! # Environment Variable Mapping
//!
//! Environment variables use the `PARLEY_` prefix with `__` as separator:
//!
//! - `PARLEY_SERVER__API_KEY=xxx` → `server.api_key = "xxx"`
//! - `PARLEY_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `PARLEY_RATE_LIMIT__MESSAGE_LIMIT=50` → `rate_limit.message_limit = 50`
//!
//! # Example
//!
//! ```rust,ignore
//! use parley_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .file("./deploy/parley.toml")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::ParleyConfig;

/// Base names searched for, in order.
#[cfg(not(feature = "yaml-config"))]
const FILE_NAMES: &[&str] = &["parley.toml"];
#[cfg(feature = "yaml-config")]
const FILE_NAMES: &[&str] = &["parley.toml", "parley.yaml", "parley.yml"];

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides.
    figment: Figment,
    /// Search paths for configuration files.
    search_paths: Vec<PathBuf>,
    /// Whether to load environment variables.
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a new configuration loader with defaults.
    pub fn new() -> Self {
        Self {
            figment: Figment::new(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges configuration values programmatically, below the config file.
    pub fn merge(mut self, config: ParleyConfig) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    ///
    /// The result is not validated; see
    /// [`validate_config`](super::validate_config).
    pub fn load(self) -> ConfigResult<ParleyConfig> {
        let (figment, source) = self.build_figment()?;

        let mut config: ParleyConfig = figment.extract()?;
        config.source = source;

        debug!(
            source = %config.origin(),
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Builds the figment instance with all sources.
    fn build_figment(mut self) -> ConfigResult<(Figment, Option<PathBuf>)> {
        let mut figment = Figment::from(Serialized::defaults(ParleyConfig::default()));

        let overrides = std::mem::take(&mut self.figment);
        figment = figment.merge(overrides);

        let source = match self.config_file.take() {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path));
                }
                info!(path = %path.display(), "Loading configuration file");
                Some(path)
            }
            None => self.find_config_file(),
        };

        if let Some(path) = &source {
            figment = merge_config_file(figment, path)?;
        } else {
            warn!("No configuration file found, using defaults and environment");
        }

        if self.load_env {
            trace!("Loading environment variables with PARLEY_ prefix");
            figment = figment.merge(Env::prefixed("PARLEY_").split("__"));
        }

        Ok((figment, source))
    }

    /// Resolves the effective list of search paths.
    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("parley"));
        }
        paths
    }

    /// Returns the first existing config file in the search paths.
    fn find_config_file(&self) -> Option<PathBuf> {
        for search_path in self.resolve_search_paths() {
            for name in FILE_NAMES {
                let candidate = search_path.join(name);
                if candidate.is_file() {
                    info!(path = %candidate.display(), "Loading configuration file");
                    return Some(candidate);
                }
            }
        }
        None
    }
}

/// Merges a single config file into the figment, dispatching on extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => Err(ConfigError::invalid(
            path.display().to_string(),
            format!("unsupported or disabled configuration file format: .{ext}"),
        )),
    }
}

/// Loads configuration from the default locations.
pub fn load_config() -> ConfigResult<ParleyConfig> {
    ConfigLoader::new().load()
}

/// Loads configuration from `path`, with environment overrides.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<ParleyConfig> {
    ConfigLoader::new().file(path).load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_defaults_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Info);
        assert!(config.source.is_none());
        assert!(config.server.site.is_empty());
    }

    #[test]
    fn test_file_in_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            site = "https://chat.example.com"
            email = "bot@example.com"
            api_key = "abc"

            [rate_limit]
            message_limit = 50
            "#,
        )
        .unwrap();

        let config = ConfigLoader::new()
            .search_path(dir.path())
            .without_env()
            .load()
            .unwrap();

        assert_eq!(config.server.site, "https://chat.example.com");
        assert_eq!(config.rate_limit.message_limit, 50);
        assert_eq!(config.rate_limit.interval_secs, 5);
        assert_eq!(config.source.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = ConfigLoader::new()
            .file(&missing)
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(p) if p == missing));
    }

    #[test]
    fn test_unknown_log_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "[logging]\nlevel = \"verbose\"\n").unwrap();

        let err = ConfigLoader::new()
            .file(&path)
            .without_env()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_merge_is_overridden_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("parley.toml");
        std::fs::write(&path, "[server]\nemail = \"from-file@example.com\"\n").unwrap();

        let mut overrides = ParleyConfig::default();
        overrides.server.email = "from-code@example.com".into();
        overrides.server.site = "https://code.example.com".into();

        let config = ConfigLoader::new()
            .merge(overrides)
            .file(&path)
            .without_env()
            .load()
            .unwrap();
        assert_eq!(config.server.email, "from-file@example.com");
        assert_eq!(config.server.site, "https://code.example.com");
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "parley.toml",
                r#"
                [server]
                site = "https://chat.example.com"
                api_key = "from-file"
                "#,
            )?;
            jail.set_env("PARLEY_SERVER__API_KEY", "from-env");
            jail.set_env("PARLEY_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.server.api_key, "from-env");
            assert_eq!(config.server.site, "https://chat.example.com");
            assert_eq!(config.logging.level, LogLevel::Debug);
            Ok(())
        });
    }
}
