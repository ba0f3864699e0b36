//! Sumi-Listings: a tolerant business-directory harvester
//!
//! This crate crawls the search-result pages of a business directory for a set of
//! (keyword, location) pairs, extracts structured business records from loosely
//! structured HTML, and exports the collected records as JSON or CSV.

pub mod config;
pub mod crawler;
pub mod listing;
pub mod output;

use thiserror::Error;

/// Main error type for Sumi-Listings operations
#[derive(Debug, Error)]
pub enum ListingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Search for '{keyword}' in '{location}' failed: {message}")]
    Search {
        keyword: String,
        location: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Sumi-Listings operations
pub type Result<T> = std::result::Result<T, ListingsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{OutputFormat, SearchInput, Settings, SortOrder};
pub use crawler::{run_crawl, CrawlReport};
pub use listing::{extract_page, parse_listing, BusinessRecord};
