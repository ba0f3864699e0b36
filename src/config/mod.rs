//! Configuration module for Sumi-Listings
//!
//! Two JSON files drive a run: the *input* (which searches to run and how to
//! export them) and the *settings* (how to talk to the directory site).
//!
//! # Example
//!
//! ```no_run
//! use sumi_listings::config::{load_input, load_settings_or_default};
//! use std::path::Path;
//!
//! let input = load_input(Path::new("data/inputs.sample.json")).unwrap();
//! let settings = load_settings_or_default(Path::new("config/settings.json")).unwrap();
//! println!("{} keywords against {}", input.keywords.len(), settings.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    OutputFormat, SearchInput, Settings, SortOrder, DEFAULT_BASE_URL,
    DEFAULT_MAX_RESULTS_PER_KEYWORD, DEFAULT_USER_AGENT, MAX_RETRY_BACKOFF_SECONDS,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_input, load_input_with_hash, load_settings,
    load_settings_or_default,
};
pub use validation::{validate_input, validate_settings};
