//! Per-bot configuration sections.
//!
//! A bot reads its own settings (API keys for third-party services, default
//! replies, ...) through [`BotHandler::get_config_info`]. Where the values
//! come from is decided by the host through a [`ConfigProvider`]; the runtime
//! ships a file-backed provider that reads `<bot_name>.conf`.
//!
//! [`BotHandler::get_config_info`]: crate::handler::BotHandler::get_config_info

use std::collections::BTreeMap;

use crate::error::BotConfigError;

/// One configuration section: key → string value.
pub type ConfigSection = BTreeMap<String, String>;

/// Source of per-bot configuration sections.
pub trait ConfigProvider: Send + Sync {
    /// Loads the section named `bot_name`.
    ///
    /// Implementations report a missing backing file with
    /// [`BotConfigError::NotFound`] so that optional lookups can fall back to
    /// an empty section.
    fn load_section(&self, bot_name: &str) -> Result<ConfigSection, BotConfigError>;
}

/// Provider used when the host supplied no configuration source at all.
///
/// Every lookup reports [`BotConfigError::NotConfigured`].
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfig;

impl ConfigProvider for NoConfig {
    fn load_section(&self, _bot_name: &str) -> Result<ConfigSection, BotConfigError> {
        Err(BotConfigError::NotConfigured)
    }
}

/// Provider backed by sections held in memory.
///
/// Useful for embedding hosts that keep configuration elsewhere and for tests.
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    sections: BTreeMap<String, ConfigSection>,
}

impl StaticConfig {
    /// Creates an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a section (builder pattern).
    pub fn with_section<I, K, V>(mut self, name: impl Into<String>, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.sections.insert(
            name.into(),
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }
}

impl ConfigProvider for StaticConfig {
    fn load_section(&self, bot_name: &str) -> Result<ConfigSection, BotConfigError> {
        self.sections
            .get(bot_name)
            .cloned()
            .ok_or_else(|| BotConfigError::NotFound {
                path: format!("{bot_name}.conf").into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_config() {
        let err = NoConfig.load_section("giphy").unwrap_err();
        assert!(matches!(err, BotConfigError::NotConfigured));
    }

    #[test]
    fn test_static_config() {
        let provider = StaticConfig::new().with_section("giphy", [("key", "12345")]);

        let section = provider.load_section("giphy").unwrap();
        assert_eq!(section.get("key").map(String::as_str), Some("12345"));

        let err = provider.load_section("xkcd").unwrap_err();
        assert!(err.is_missing());
    }
}
