//! Crawler coordinator - runs every (keyword, location) search of a run
//!
//! Searches are enumerated keyword-major. A search that fails is reported and
//! contributes no records; the rest of the run carries on. Records are
//! concatenated in search order and never deduplicated across searches.
//!
//! Every search runs as its own task. With `max_concurrent_searches == 1` each
//! task is awaited before the next is spawned; otherwise tasks are gated by a
//! semaphore. A search that panics is reported like any other failed search.
//! Pages within a search stay sequential, and the output order is the search
//! order.

use crate::config::{SearchInput, Settings};
use crate::crawler::events::{CrawlEvent, CrawlEvents, StopReason};
use crate::crawler::fetcher::build_http_client;
use crate::crawler::pagination::{crawl_search, CrawlRequest, SearchOutcome};
use crate::listing::BusinessRecord;
use crate::ListingsError;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Per-search line of a crawl report
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSummary {
    pub keyword: String,
    pub location: String,
    pub records: usize,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub listings_skipped: usize,

    /// `None` when the search failed
    pub stop_reason: Option<StopReason>,

    /// Error message of a failed search
    pub failure: Option<String>,
}

impl SearchSummary {
    fn completed(request: &CrawlRequest, outcome: &SearchOutcome) -> Self {
        Self {
            keyword: request.keyword.clone(),
            location: request.location.clone(),
            records: outcome.records.len(),
            pages_fetched: outcome.pages_fetched,
            pages_skipped: outcome.pages_skipped,
            listings_skipped: outcome.listings_skipped,
            stop_reason: Some(outcome.stop_reason),
            failure: None,
        }
    }

    fn failed(request: &CrawlRequest, error: String) -> Self {
        Self {
            keyword: request.keyword.clone(),
            location: request.location.clone(),
            records: 0,
            pages_fetched: 0,
            pages_skipped: 0,
            listings_skipped: 0,
            stop_reason: None,
            failure: Some(error),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// All records, in search order
    pub records: Vec<BusinessRecord>,

    /// One summary per search, in search order
    pub searches: Vec<SearchSummary>,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn pages_fetched(&self) -> u32 {
        self.searches.iter().map(|s| s.pages_fetched).sum()
    }

    pub fn pages_skipped(&self) -> u32 {
        self.searches.iter().map(|s| s.pages_skipped).sum()
    }

    pub fn listings_skipped(&self) -> usize {
        self.searches.iter().map(|s| s.listings_skipped).sum()
    }

    pub fn failed_searches(&self) -> usize {
        self.searches.iter().filter(|s| s.is_failed()).count()
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

/// Expands the input into searches, keyword-major
pub fn plan_searches(input: &SearchInput) -> Vec<CrawlRequest> {
    input
        .keywords
        .iter()
        .flat_map(|keyword| {
            input.locations.iter().map(move |location| CrawlRequest {
                keyword: keyword.clone(),
                location: location.clone(),
                max_results: input.max_results_per_keyword,
                sort_order: input.sort_by,
            })
        })
        .collect()
}

/// Runs one search and folds any failure into the summary
async fn run_search(
    client: &Client,
    settings: &Settings,
    request: &CrawlRequest,
    events: &dyn CrawlEvents,
) -> (Vec<BusinessRecord>, SearchSummary) {
    events.record(CrawlEvent::SearchStarted {
        keyword: request.keyword.clone(),
        location: request.location.clone(),
    });

    match crawl_search(client, settings, request, events).await {
        Ok(outcome) => {
            events.record(CrawlEvent::SearchFinished {
                keyword: request.keyword.clone(),
                location: request.location.clone(),
                records: outcome.records.len(),
            });
            let summary = SearchSummary::completed(request, &outcome);
            (outcome.records, summary)
        }
        Err(e) => search_failed(request, e, events),
    }
}

fn search_failed(
    request: &CrawlRequest,
    error: ListingsError,
    events: &dyn CrawlEvents,
) -> (Vec<BusinessRecord>, SearchSummary) {
    let message = error.to_string();
    events.record(CrawlEvent::SearchFailed {
        keyword: request.keyword.clone(),
        location: request.location.clone(),
        error: message.clone(),
    });
    (Vec::new(), SearchSummary::failed(request, message))
}

/// Main crawler coordinator structure
pub struct Coordinator {
    settings: Arc<Settings>,
    client: Client,
    events: Arc<dyn CrawlEvents>,
}

impl Coordinator {
    /// Creates a coordinator with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns [`ListingsError::Reqwest`] if the HTTP client cannot be built.
    pub fn new(settings: Settings, events: Arc<dyn CrawlEvents>) -> Result<Self, ListingsError> {
        let client = build_http_client(&settings)?;
        Ok(Self {
            settings: Arc::new(settings),
            client,
            events,
        })
    }

    /// Runs every search of `input` and collects the results
    pub async fn run(&self, input: &SearchInput) -> CrawlReport {
        let started_at = Utc::now();
        let requests = plan_searches(input);

        tracing::info!(
            "Starting run: {} searches ({} keywords x {} locations), max {} results each, sort={}",
            requests.len(),
            input.keywords.len(),
            input.locations.len(),
            input.max_results_per_keyword,
            input.sort_by.code()
        );

        let results = self.run_searches(&requests).await;

        let mut records = Vec::new();
        let mut searches = Vec::with_capacity(results.len());
        for (search_records, summary) in results {
            records.extend(search_records);
            searches.push(summary);
        }

        tracing::info!("Total records collected: {}", records.len());

        CrawlReport {
            records,
            searches,
            started_at,
            finished_at: Utc::now(),
        }
    }

    async fn run_searches(
        &self,
        requests: &[CrawlRequest],
    ) -> Vec<(Vec<BusinessRecord>, SearchSummary)> {
        let permits = self.settings.max_concurrent_searches.max(1);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut results = Vec::with_capacity(requests.len());

        if permits == 1 {
            for request in requests {
                let handle = self.spawn_search(request.clone(), Arc::clone(&semaphore));
                results.push(self.join_search(request, handle).await);
            }
            return results;
        }

        let handles: Vec<_> = requests
            .iter()
            .map(|request| self.spawn_search(request.clone(), Arc::clone(&semaphore)))
            .collect();

        // Awaiting in submission order keeps the output in search order
        for (request, handle) in requests.iter().zip(handles) {
            results.push(self.join_search(request, handle).await);
        }
        results
    }

    fn spawn_search(
        &self,
        request: CrawlRequest,
        semaphore: Arc<Semaphore>,
    ) -> JoinHandle<(Vec<BusinessRecord>, SearchSummary)> {
        let client = self.client.clone();
        let settings = Arc::clone(&self.settings);
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    let error = ListingsError::Search {
                        keyword: request.keyword.clone(),
                        location: request.location.clone(),
                        message: e.to_string(),
                    };
                    return search_failed(&request, error, events.as_ref());
                }
            };
            run_search(&client, &settings, &request, events.as_ref()).await
        })
    }

    /// Waits for a search task; a panicked task becomes a failed search
    async fn join_search(
        &self,
        request: &CrawlRequest,
        handle: JoinHandle<(Vec<BusinessRecord>, SearchSummary)>,
    ) -> (Vec<BusinessRecord>, SearchSummary) {
        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let error = ListingsError::Search {
                    keyword: request.keyword.clone(),
                    location: request.location.clone(),
                    message: format!("search task ended abnormally: {}", e),
                };
                search_failed(request, error, self.events.as_ref())
            }
        }
    }
}

/// Runs a complete crawl for `input`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use std::sync::Arc;
/// use sumi_listings::config::{load_input, load_settings_or_default};
/// use sumi_listings::crawler::{run_crawl, TracingEvents};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let input = load_input(Path::new("data/inputs.sample.json"))?;
/// let settings = load_settings_or_default(Path::new("config/settings.json"))?;
/// let report = run_crawl(&input, settings, Arc::new(TracingEvents)).await?;
/// println!("{} records", report.records.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    input: &SearchInput,
    settings: Settings,
    events: Arc<dyn CrawlEvents>,
) -> Result<CrawlReport, ListingsError> {
    let coordinator = Coordinator::new(settings, events)?;
    Ok(coordinator.run(input).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OutputFormat, SortOrder};
    use crate::crawler::events::CollectedEvents;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn input(keywords: &[&str], locations: &[&str], max_results: usize) -> SearchInput {
        SearchInput {
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            max_results_per_keyword: max_results,
            sort_by: SortOrder::BestMatch,
            output_format: OutputFormat::Json,
        }
    }

    fn page_with(name: &str) -> String {
        format!(
            r#"<html><body><div class="result"><a class="business-name">{}</a></div></body></html>"#,
            name
        )
    }

    async fn mount_search(server: &MockServer, keyword: &str, location: &str, status: u16, name: &str) {
        Mock::given(method("GET"))
            .and(query_param("search_terms", keyword))
            .and(query_param("geo_location_terms", location))
            .respond_with(ResponseTemplate::new(status).set_body_string(page_with(name)))
            .mount(server)
            .await;
    }

    fn settings(base_url: &str, concurrency: usize) -> Settings {
        Settings {
            base_url: base_url.to_string(),
            max_pages_per_search: 1,
            retry_attempts: 1,
            retry_backoff_seconds: 0.0,
            max_concurrent_searches: concurrency,
            ..Settings::default()
        }
    }

    #[test]
    fn test_plan_is_keyword_major() {
        let plan = plan_searches(&input(&["pizza", "tacos"], &["Austin", "Dallas"], 7));
        let pairs: Vec<(&str, &str)> = plan
            .iter()
            .map(|r| (r.keyword.as_str(), r.location.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("pizza", "Austin"),
                ("pizza", "Dallas"),
                ("tacos", "Austin"),
                ("tacos", "Dallas"),
            ]
        );
        assert!(plan.iter().all(|r| r.max_results == 7));
    }

    /// Panics when a search for `keyword` starts, collects everything else
    struct PanicOnKeyword {
        keyword: &'static str,
        inner: CollectedEvents,
    }

    impl CrawlEvents for PanicOnKeyword {
        fn record(&self, event: CrawlEvent) {
            if let CrawlEvent::SearchStarted { keyword, .. } = &event {
                if keyword == self.keyword {
                    panic!("sink failure for '{}'", keyword);
                }
            }
            self.inner.record(event);
        }
    }

    async fn run_with_panicking_search(concurrency: usize) {
        let server = MockServer::start().await;
        mount_search(&server, "pizza", "Austin", 200, "Pizza Austin").await;
        mount_search(&server, "tacos", "Austin", 200, "Tacos Austin").await;

        let events = Arc::new(PanicOnKeyword {
            keyword: "boom",
            inner: CollectedEvents::new(),
        });
        let coordinator =
            Coordinator::new(settings(&server.uri(), concurrency), events.clone()).unwrap();
        let report = coordinator
            .run(&input(&["pizza", "boom", "tacos"], &["Austin"], 5))
            .await;

        let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Pizza Austin", "Tacos Austin"]);
        assert_eq!(report.failed_searches(), 1);
        assert!(report.searches[1].is_failed());
        assert_eq!(report.searches[1].keyword, "boom");
        assert_eq!(
            events
                .inner
                .count(|e| matches!(e, CrawlEvent::SearchFailed { .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_panicking_search_is_isolated_sequential() {
        run_with_panicking_search(1).await;
    }

    #[tokio::test]
    async fn test_panicking_search_is_isolated_concurrent() {
        run_with_panicking_search(3).await;
    }

    #[tokio::test]
    async fn test_unparsable_base_url_fails_every_search() {
        let events = Arc::new(CollectedEvents::new());
        let coordinator = Coordinator::new(settings("not a url", 1), events.clone()).unwrap();
        let report = coordinator
            .run(&input(&["pizza"], &["Austin", "Dallas"], 5))
            .await;

        assert!(report.records.is_empty());
        assert_eq!(report.failed_searches(), 2);
        assert_eq!(
            events.count(|e| matches!(e, CrawlEvent::SearchFailed { .. })),
            2
        );
    }

    #[tokio::test]
    async fn test_duplicates_across_searches_are_kept() {
        let server = MockServer::start().await;
        mount_search(&server, "pizza", "Austin", 200, "Joe's Pizza").await;
        mount_search(&server, "italian", "Austin", 200, "Joe's Pizza").await;

        let coordinator =
            Coordinator::new(settings(&server.uri(), 1), Arc::new(CollectedEvents::new())).unwrap();
        let report = coordinator
            .run(&input(&["pizza", "italian"], &["Austin"], 5))
            .await;

        assert_eq!(report.records.len(), 2);
        assert_eq!(report.searches.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_run_keeps_search_order() {
        let server = MockServer::start().await;
        for (keyword, location) in [("a", "x"), ("a", "y"), ("b", "x"), ("b", "y")] {
            let name = format!("{}-{}", keyword, location);
            mount_search(&server, keyword, location, 200, &name).await;
        }

        let coordinator =
            Coordinator::new(settings(&server.uri(), 3), Arc::new(CollectedEvents::new())).unwrap();
        let report = coordinator.run(&input(&["a", "b"], &["x", "y"], 5)).await;

        let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a-x", "a-y", "b-x", "b-y"]);
        assert_eq!(report.pages_fetched(), 4);
        assert_eq!(report.failed_searches(), 0);
    }

    #[tokio::test]
    async fn test_exhausted_search_contributes_nothing() {
        let server = MockServer::start().await;
        mount_search(&server, "pizza", "Austin", 503, "unused").await;

        let coordinator =
            Coordinator::new(settings(&server.uri(), 1), Arc::new(CollectedEvents::new())).unwrap();
        let report = coordinator.run(&input(&["pizza"], &["Austin"], 5)).await;

        assert!(report.records.is_empty());
        assert_eq!(report.pages_skipped(), 1);
        assert_eq!(report.failed_searches(), 0);
        assert_eq!(
            report.searches[0].stop_reason,
            Some(StopReason::CeilingReached)
        );
    }
}
