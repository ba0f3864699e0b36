use crate::config::types::{SearchInput, Settings, MAX_RETRY_BACKOFF_SECONDS};
use crate::ConfigError;
use url::Url;

/// Validates crawler settings
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_base_url(&settings.base_url)?;

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if settings.timeout_seconds < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_seconds must be >= 1, got {}",
            settings.timeout_seconds
        )));
    }

    if settings.max_pages_per_search < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages_per_search must be >= 1, got {}",
            settings.max_pages_per_search
        )));
    }

    if settings.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be >= 1, got {}",
            settings.retry_attempts
        )));
    }

    if !(0.0..=MAX_RETRY_BACKOFF_SECONDS).contains(&settings.retry_backoff_seconds) {
        return Err(ConfigError::Validation(format!(
            "retry_backoff_seconds must be between 0 and {}, got {}",
            MAX_RETRY_BACKOFF_SECONDS, settings.retry_backoff_seconds
        )));
    }

    if settings.max_concurrent_searches < 1 || settings.max_concurrent_searches > 16 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_searches must be between 1 and 16, got {}",
            settings.max_concurrent_searches
        )));
    }

    Ok(())
}

/// Validates the run input
pub fn validate_input(input: &SearchInput) -> Result<(), ConfigError> {
    if input.keywords.is_empty() || input.locations.is_empty() {
        return Err(ConfigError::Validation(
            "Input configuration must define non-empty 'keywords' and 'locations'".to_string(),
        ));
    }

    if input.keywords.iter().any(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "keywords cannot contain blank entries".to_string(),
        ));
    }

    if input.locations.iter().any(|l| l.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "locations cannot contain blank entries".to_string(),
        ));
    }

    Ok(())
}

/// The base URL must be an absolute http(s) URL
fn validate_base_url(base_url: &str) -> Result<(), ConfigError> {
    let url = Url::parse(base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", base_url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            base_url
        )));
    }

    Ok(())
}
