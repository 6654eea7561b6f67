//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogOutput, ParleyConfig};

/// Validates a loaded configuration.
///
/// Errors name the file the configuration came from.
pub fn validate_config(config: &ParleyConfig) -> ConfigResult<()> {
    let origin = config.origin();
    let invalid = |message: String| Err(ConfigError::invalid(origin.clone(), message));

    let server = &config.server;
    for (field, value) in [
        ("server.site", &server.site),
        ("server.email", &server.email),
        ("server.api_key", &server.api_key),
    ] {
        if value.trim().is_empty() {
            return invalid(format!("missing required field `{field}`"));
        }
    }

    if !(server.site.starts_with("http://") || server.site.starts_with("https://")) {
        return invalid(format!(
            "`server.site` must be an http(s) URL, got \"{}\"",
            server.site
        ));
    }

    if server.timeout_secs == 0 || server.poll_timeout_secs == 0 {
        return invalid("server timeouts must be greater than 0".to_string());
    }

    if config.rate_limit.message_limit == 0 {
        return invalid("`rate_limit.message_limit` must be greater than 0".to_string());
    }
    if config.rate_limit.interval_secs == 0 {
        return invalid("`rate_limit.interval_secs` must be greater than 0".to_string());
    }

    if config.logging.output == LogOutput::File && config.logging.file_path.is_none() {
        return invalid("`logging.output = \"file\"` requires `logging.file_path`".to_string());
    }

    Ok(())
}
