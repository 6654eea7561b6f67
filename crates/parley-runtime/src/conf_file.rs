//! File-backed bot configuration.
//!
//! A bot's own settings live in a small INI file with one section per bot:
//!
//! ```ini
//! [giphy]
//! key = 12345678
//! ; comments start with `;` or `#`
//! rating: g
//! ```
//!
//! Every value is read as a string, with surrounding whitespace removed. Keys
//! are lowercased. By default the file is `<root_dir>/<bot_name>.conf`; hosts
//! can point at an explicit file instead.

use std::path::{Path, PathBuf};

use ini::Ini;
use parley_framework::{BotConfigError, ConfigProvider, ConfigSection};
use tracing::debug;

/// [`ConfigProvider`] reading INI `.conf` files.
#[derive(Debug, Clone)]
pub enum ConfFileProvider {
    /// Reads `<dir>/<bot_name>.conf`.
    Directory(PathBuf),
    /// Reads the given file for every bot name.
    File(PathBuf),
}

impl ConfFileProvider {
    /// Looks up `<dir>/<bot_name>.conf`.
    pub fn directory(dir: impl Into<PathBuf>) -> Self {
        Self::Directory(dir.into())
    }

    /// Always reads `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// File consulted for `bot_name`.
    pub fn path_for(&self, bot_name: &str) -> PathBuf {
        match self {
            Self::Directory(dir) => dir.join(format!("{bot_name}.conf")),
            Self::File(path) => path.clone(),
        }
    }
}

impl ConfigProvider for ConfFileProvider {
    fn load_section(&self, bot_name: &str) -> Result<ConfigSection, BotConfigError> {
        let path = self.path_for(bot_name);
        if !path.is_file() {
            return Err(BotConfigError::NotFound { path });
        }

        debug!(path = %path.display(), section = bot_name, "Reading bot configuration");
        let ini = Ini::load_from_file(&path).map_err(|e| invalid(&path, e))?;
        let properties =
            ini.section(Some(bot_name))
                .ok_or_else(|| BotConfigError::MissingSection {
                    path: path.clone(),
                    section: bot_name.to_string(),
                })?;

        Ok(properties
            .iter()
            .map(|(key, value)| (key.to_lowercase(), value.to_string()))
            .collect())
    }
}

fn invalid(path: &Path, error: ini::Error) -> BotConfigError {
    BotConfigError::Invalid {
        path: path.to_path_buf(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_section_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("giphy.conf"),
            "[giphy]\nkey = 12345678\nrating = g\n",
        )
        .unwrap();

        let section = ConfFileProvider::directory(dir.path())
            .load_section("giphy")
            .unwrap();
        assert_eq!(section.len(), 2);
        assert_eq!(section["key"], "12345678");
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfFileProvider::directory(dir.path())
            .load_section("giphy")
            .unwrap_err();
        assert!(err.is_missing());
        assert!(err.to_string().contains("giphy.conf"));
    }

    #[test]
    fn test_missing_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bots.conf");
        std::fs::write(&path, "[xkcd]\nstyle = comic\n").unwrap();

        let err = ConfFileProvider::file(&path)
            .load_section("giphy")
            .unwrap_err();
        assert!(matches!(
            err,
            BotConfigError::MissingSection { ref section, .. } if section == "giphy"
        ));
        assert!(!err.is_missing());
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("giphy.conf");
        std::fs::write(&path, "[giphy\nkey = abc\n").unwrap();

        let err = ConfFileProvider::directory(dir.path())
            .load_section("giphy")
            .unwrap_err();
        assert!(matches!(err, BotConfigError::Invalid { .. }));
    }

    #[test]
    fn test_explicit_file_serves_any_bot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("all.conf");
        std::fs::write(&path, "[a]\nx = 1\n[b]\ny = 2\n").unwrap();

        let provider = ConfFileProvider::file(&path);
        assert_eq!(provider.load_section("a").unwrap()["x"], "1");
        assert_eq!(provider.load_section("b").unwrap()["y"], "2");
        assert_eq!(provider.path_for("whatever"), path);
    }

    #[test]
    fn test_values_are_plain_strings() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("xkcd.conf"),
            "# deployment settings\n\
             [xkcd]\n\
             key=abc123def\n\
             port = 8080\n\
             Greeting: hello world\n\
             ; trailing comment\n",
        )
        .unwrap();

        let section = ConfFileProvider::directory(dir.path())
            .load_section("xkcd")
            .unwrap();
        assert_eq!(section["key"], "abc123def");
        assert_eq!(section["port"], "8080");
        assert_eq!(section["greeting"], "hello world");
        assert_eq!(section.len(), 3);
    }
}
