//! Crawl events
//!
//! The fetcher, the pagination controller and the coordinator report what they
//! decide through a [`CrawlEvents`] sink handed to them by the caller. The binary
//! uses [`TracingEvents`] to turn events into log lines; tests use
//! [`CollectedEvents`] to assert on them.

use crate::crawler::fetcher::AttemptFailure;
use crate::listing::SkipReason;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

/// Why the pagination controller stopped requesting pages for a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Enough records were collected
    TargetReached,

    /// A fetched page contained no listings
    DirectoryExhausted,

    /// The page budget estimated from page 1 was used up
    BudgetReached,

    /// The configured page ceiling was reached
    CeilingReached,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::TargetReached => "requested result count reached",
            Self::DirectoryExhausted => "no more records",
            Self::BudgetReached => "estimated page budget reached",
            Self::CeilingReached => "page ceiling reached",
        };
        f.write_str(text)
    }
}

/// Something observable that happened during a crawl
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlEvent {
    SearchStarted {
        keyword: String,
        location: String,
    },

    /// One GET attempt failed; `retry_in` is `None` after the last attempt
    FetchAttemptFailed {
        url: String,
        attempt: u32,
        max_attempts: u32,
        failure: AttemptFailure,
        retry_in: Option<Duration>,
    },

    /// Every attempt for a page failed; the page contributes nothing
    PageSkipped {
        keyword: String,
        location: String,
        page: u32,
        attempts: u32,
    },

    PageParsed {
        keyword: String,
        location: String,
        page: u32,
        records: usize,
    },

    ListingSkipped {
        page: u32,
        position: usize,
        reason: SkipReason,
    },

    BudgetEstimated {
        first_page_records: usize,
        pages: u32,
    },

    SearchStopped {
        keyword: String,
        location: String,
        page: u32,
        reason: StopReason,
    },

    SearchFinished {
        keyword: String,
        location: String,
        records: usize,
    },

    /// The whole search failed; it contributes no records
    SearchFailed {
        keyword: String,
        location: String,
        error: String,
    },
}

/// Sink for crawl events
pub trait CrawlEvents: Send + Sync {
    fn record(&self, event: CrawlEvent);
}

/// Writes every event to the `tracing` subscriber
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl CrawlEvents for TracingEvents {
    fn record(&self, event: CrawlEvent) {
        match event {
            CrawlEvent::SearchStarted { keyword, location } => {
                tracing::info!(
                    "Fetching businesses for keyword='{}', location='{}'",
                    keyword,
                    location
                );
            }
            CrawlEvent::FetchAttemptFailed {
                url,
                attempt,
                max_attempts,
                failure,
                retry_in,
            } => {
                tracing::warn!(
                    "GET {} failed (attempt {}/{}): {}",
                    url,
                    attempt,
                    max_attempts,
                    failure
                );
                if let Some(delay) = retry_in {
                    tracing::debug!("Sleeping {:.2} seconds before retry", delay.as_secs_f64());
                }
            }
            CrawlEvent::PageSkipped {
                keyword,
                location,
                page,
                attempts,
            } => {
                tracing::error!(
                    "Skipping page {} for '{}' in '{}' after {} failed attempts",
                    page,
                    keyword,
                    location,
                    attempts
                );
            }
            CrawlEvent::PageParsed {
                keyword,
                location,
                page,
                records,
            } => {
                tracing::info!(
                    "Parsed {} records from page {} (keyword='{}', location='{}')",
                    records,
                    page,
                    keyword,
                    location
                );
            }
            CrawlEvent::ListingSkipped {
                page,
                position,
                reason,
            } => {
                tracing::debug!("Skipped listing {} on page {}: {}", position, page, reason);
            }
            CrawlEvent::BudgetEstimated {
                first_page_records,
                pages,
            } => {
                tracing::debug!(
                    "Estimated total pages to fetch: {} (first page yielded {})",
                    pages,
                    first_page_records
                );
            }
            CrawlEvent::SearchStopped {
                keyword,
                location,
                page,
                reason,
            } => {
                tracing::debug!(
                    "Stopped '{}' in '{}' at page {}: {}",
                    keyword,
                    location,
                    page,
                    reason
                );
            }
            CrawlEvent::SearchFinished {
                keyword,
                location,
                records,
            } => {
                tracing::info!(
                    "Fetched {} records for '{}' in '{}'",
                    records,
                    keyword,
                    location
                );
            }
            CrawlEvent::SearchFailed {
                keyword,
                location,
                error,
            } => {
                tracing::error!(
                    "Failed to fetch businesses for keyword='{}', location='{}': {}",
                    keyword,
                    location,
                    error
                );
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct CollectedEvents {
    events: Mutex<Vec<CrawlEvent>>,
}

impl CollectedEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, in order
    pub fn events(&self) -> Vec<CrawlEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded events matching `predicate`
    pub fn count(&self, predicate: impl Fn(&CrawlEvent) -> bool) -> usize {
        self.events().iter().filter(|event| predicate(event)).count()
    }
}

impl CrawlEvents for CollectedEvents {
    fn record(&self, event: CrawlEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}
