use serde::Deserialize;
use std::fmt;

pub const DEFAULT_BASE_URL: &str = "https://www.yellowpages.com";
pub const DEFAULT_USER_AGENT: &str = "YellowpagesScraperBot/1.0 (+https://bitbash.dev)";
pub const DEFAULT_MAX_RESULTS_PER_KEYWORD: usize = 50;

/// Largest accepted `retry_backoff_seconds`
pub const MAX_RETRY_BACKOFF_SECONDS: f64 = 300.0;

/// Process-wide crawler settings, loaded once at startup and never mutated
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the directory site, e.g. `https://www.yellowpages.com`
    pub base_url: String,

    /// Value sent in the `User-Agent` header
    pub user_agent: String,

    /// Per-request socket timeout (seconds)
    pub timeout_seconds: u64,

    /// Hard ceiling on pages requested for one search
    pub max_pages_per_search: u32,

    /// GET attempts per page before the page is given up
    pub retry_attempts: u32,

    /// Linear backoff base between attempts (seconds)
    pub retry_backoff_seconds: f64,

    /// Number of (keyword, location) searches allowed to run at once
    pub max_concurrent_searches: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_seconds: 15,
            max_pages_per_search: 5,
            retry_attempts: 2,
            retry_backoff_seconds: 1.5,
            max_concurrent_searches: 1,
        }
    }
}

/// The run description: what to search for and how to export it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub locations: Vec<String>,

    #[serde(default = "default_max_results")]
    pub max_results_per_keyword: usize,

    #[serde(default)]
    pub sort_by: SortOrder,

    #[serde(default)]
    pub output_format: OutputFormat,
}

fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS_PER_KEYWORD
}

/// Result ordering requested from the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    BestMatch,
    Distance,
    Rating,
    Name,
}

impl SortOrder {
    /// Maps a configured sort name onto a sort order; unknown names mean best match
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "distance" => Self::Distance,
            "rating" => Self::Rating,
            "name" => Self::Name,
            _ => Self::BestMatch,
        }
    }

    /// The `sort` query code understood by the directory
    pub fn code(&self) -> &'static str {
        match self {
            Self::BestMatch => "best",
            Self::Distance => "distance",
            Self::Rating => "rating",
            Self::Name => "name",
        }
    }
}

impl<'de> Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        let order = Self::from_name(&name);
        if order == Self::BestMatch && !name.trim().eq_ignore_ascii_case("best_match") {
            tracing::warn!("Unrecognized sort_by '{}', using best_match", name);
        }
        Ok(order)
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl OutputFormat {
    /// Parses a format name; anything other than `csv` falls back to JSON
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Self::Csv,
            "json" => Self::Json,
            other => {
                tracing::warn!(
                    "Unsupported output_format '{}' in input config; falling back to JSON",
                    other
                );
                Self::Json
            }
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Csv => write!(f, "CSV"),
        }
    }
}

impl<'de> Deserialize<'de> for OutputFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}
