use std::env;

use crate::config::ConfigError;

pub(crate) fn require_env(key: &str) -> Result<String, ConfigError> {
    optional_trimmed_env(key).ok_or_else(|| ConfigError::MissingVar(key.to_string()))
}

pub(crate) fn parse_optional_u64_env(key: &str) -> Result<Option<u64>, ConfigError> {
    optional_trimmed_env(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map_err(|_| ConfigError::ParseInt(key.to_string()))
        })
        .transpose()
}

pub(crate) fn optional_trimmed_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

pub(crate) fn ensure_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return Ok(());
    }

    Err(ConfigError::InvalidConfiguration(format!(
        "{key} must start with http:// or https://"
    )))
}
