use crate::config::types::{SearchInput, Settings};
use crate::config::validation::{validate_input, validate_settings};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates the run input file
///
/// # Arguments
///
/// * `path` - Path to the JSON input configuration
///
/// # Returns
///
/// * `Ok(SearchInput)` - Successfully loaded and validated input
/// * `Err(ConfigError)` - The file is missing, malformed, or names no searches
pub fn load_input(path: &Path) -> Result<SearchInput, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(format!(
            "Input configuration file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let input: SearchInput = serde_json::from_str(&content)?;

    validate_input(&input)?;

    Ok(input)
}

/// Loads and validates a settings file
///
/// Unlike [`load_settings_or_default`], a missing file is an error here.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(format!(
            "Settings file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    Ok(settings)
}

/// Loads settings, falling back to the built-in defaults when the file is absent
///
/// A file that exists but cannot be parsed or validated is still an error.
pub fn load_settings_or_default(path: &Path) -> Result<Settings, ConfigError> {
    match load_settings(path) {
        Err(ConfigError::NotFound(_)) => {
            tracing::warn!(
                "Settings file not found at {}, using built-in defaults",
                path.display()
            );
            Ok(Settings::default())
        }
        other => other,
    }
}

/// Computes a SHA-256 hash of a configuration file's content
///
/// The hash is logged at startup so two runs can be told apart by their inputs.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads the run input and returns it together with its content hash
pub fn load_input_with_hash(path: &Path) -> Result<(SearchInput, String), ConfigError> {
    let input = load_input(path)?;
    let hash = compute_config_hash(path)?;
    Ok((input, hash))
}
