//! Crawler module for fetching and paginating directory searches
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retries and jittered backoff
//! - Page-by-page crawling of one search with a page budget
//! - Running every (keyword, location) search of a run
//! - The event sink the above report their decisions through

mod coordinator;
mod events;
mod fetcher;
mod pagination;

pub use coordinator::{plan_searches, run_crawl, Coordinator, CrawlReport, SearchSummary};
pub use events::{CollectedEvents, CrawlEvent, CrawlEvents, StopReason, TracingEvents};
pub use fetcher::{
    build_http_client, fetch_with_retry, AttemptFailure, FetchResult, RetryPolicy,
    ACCEPT_LANGUAGE_VALUE, DEFAULT_MAX_JITTER,
};
pub use pagination::{
    build_search_url, crawl_search, estimate_page_budget, CrawlRequest, SearchOutcome,
    ASSUMED_RESULTS_PER_PAGE,
};
