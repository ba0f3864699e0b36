//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests with bounded retries and jittered linear backoff
//! - Classifying each failed attempt

use crate::config::{Settings, MAX_RETRY_BACKOFF_SECONDS};
use crate::crawler::events::{CrawlEvent, CrawlEvents};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// `Accept-Language` sent with every request
pub const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Upper bound of the random jitter added to every backoff delay
pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Why a single GET attempt did not succeed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The server answered with something other than 200
    Status(u16),

    /// The request timed out
    Timeout,

    /// The connection could not be established
    Connect(String),

    /// Any other transport error, including a body that could not be read
    Network(String),
}

impl AttemptFailure {
    fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Network(error.to_string())
        }
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "received status {}", code),
            Self::Timeout => write!(f, "request timeout"),
            Self::Connect(error) => write!(f, "connection failed: {}", error),
            Self::Network(error) => write!(f, "request error: {}", error),
        }
    }
}

/// Result of a fetch with retries
#[derive(Debug)]
pub enum FetchResult {
    /// A 200 response was received
    Success {
        /// Response body
        body: String,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// Every attempt failed; the caller treats this as "no data", not an error
    Exhausted {
        attempts: u32,
        last_failure: Option<AttemptFailure>,
    },
}

/// How many times to try a GET and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, at least 1
    pub attempts: u32,

    /// Delay after the n-th failed attempt is `backoff_base * n` plus jitter
    pub backoff_base: Duration,

    /// Jitter is drawn uniformly from `[0, max_jitter)`
    pub max_jitter: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff_base: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff_base,
            max_jitter: DEFAULT_MAX_JITTER,
        }
    }

    /// Backoff bases outside `0..=MAX_RETRY_BACKOFF_SECONDS` are clamped into range
    pub fn from_settings(settings: &Settings) -> Self {
        let seconds = settings
            .retry_backoff_seconds
            .clamp(0.0, MAX_RETRY_BACKOFF_SECONDS);
        let backoff_base = Duration::try_from_secs_f64(seconds).unwrap_or_default();
        Self::new(settings.retry_attempts, backoff_base)
    }

    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Linear part of the delay after the `attempt`-th failure (1-based)
    pub fn base_delay(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }

    /// Full delay after the `attempt`-th failure: linear backoff plus random jitter
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let jitter = if self.max_jitter.is_zero() {
            Duration::ZERO
        } else {
            let secs = rand::thread_rng().gen_range(0.0..self.max_jitter.as_secs_f64());
            Duration::from_secs_f64(secs)
        };
        self.base_delay(attempt).saturating_add(jitter)
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client sends the configured `User-Agent` and the fixed
/// `Accept-Language` header on every request, and applies the configured
/// per-request timeout.
///
/// # Example
///
/// ```no_run
/// use sumi_listings::config::Settings;
/// use sumi_listings::crawler::build_http_client;
///
/// let client = build_http_client(&Settings::default()).unwrap();
/// ```
pub fn build_http_client(settings: &Settings) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );

    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(settings.timeout_seconds))
        .gzip(true)
        .brotli(true)
        .build()
}

/// GETs `url`, retrying any non-200 status or transport error
///
/// # Retry Logic
///
/// | Outcome | Action |
/// |---------|--------|
/// | HTTP 200 | Return the body |
/// | Any other status | Retry |
/// | Timeout / connection / body error | Retry |
/// | Attempts used up | Return `Exhausted` |
///
/// Between attempts (never after the last) the task sleeps for
/// `backoff_base * attempt` plus up to `max_jitter` of random jitter.
pub async fn fetch_with_retry(
    client: &Client,
    url: &str,
    policy: &RetryPolicy,
    events: &dyn CrawlEvents,
) -> FetchResult {
    let mut last_failure = None;

    for attempt in 1..=policy.attempts {
        tracing::debug!("GET {} (attempt {})", url, attempt);

        let failure = match client.get(url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                match response.text().await {
                    Ok(body) => return FetchResult::Success { body, attempts: attempt },
                    Err(e) => AttemptFailure::from_reqwest(&e),
                }
            }
            Ok(response) => AttemptFailure::Status(response.status().as_u16()),
            Err(e) => AttemptFailure::from_reqwest(&e),
        };

        let retry_in = (attempt < policy.attempts).then(|| policy.delay_after(attempt));
        events.record(CrawlEvent::FetchAttemptFailed {
            url: url.to_string(),
            attempt,
            max_attempts: policy.attempts,
            failure: failure.clone(),
            retry_in,
        });
        last_failure = Some(failure);

        if let Some(delay) = retry_in {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::error!("Failed to GET {} after {} attempts", url, policy.attempts);
    FetchResult::Exhausted {
        attempts: policy.attempts,
        last_failure,
    }
}
