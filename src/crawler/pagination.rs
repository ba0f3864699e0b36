//! Pagination controller for a single (keyword, location) search
//!
//! Pages are requested strictly one after another. The first page's yield decides
//! how many pages are worth requesting at all; after that the search stops on the
//! first of: enough records, an empty page, the estimated budget, or the hard
//! page ceiling from the settings.

use crate::config::{Settings, SortOrder};
use crate::crawler::events::{CrawlEvent, CrawlEvents, StopReason};
use crate::crawler::fetcher::{fetch_with_retry, FetchResult, RetryPolicy};
use crate::listing::{extract_page, BusinessRecord};
use crate::ListingsError;
use reqwest::Client;
use url::Url;

/// Page size assumed when the first page yields fewer listings than this
///
/// This is a heuristic about the directory's usual page size, not a guarantee
/// of the site. It keeps a thin first page from inflating the page budget.
pub const ASSUMED_RESULTS_PER_PAGE: usize = 30;

/// One search to run: what to look for, where, and how many records to keep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub keyword: String,
    pub location: String,
    pub max_results: usize,
    pub sort_order: SortOrder,
}

/// What one search produced
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Records in page order, at most `max_results`
    pub records: Vec<BusinessRecord>,

    /// Pages that returned a 200 response
    pub pages_fetched: u32,

    /// Pages given up after every attempt failed
    pub pages_skipped: u32,

    /// Listing fragments dropped for lack of a name
    pub listings_skipped: usize,

    /// Page budget estimated from page 1, if page 1 was fetched
    pub estimated_budget: Option<u32>,

    pub stop_reason: StopReason,
}

/// Builds the results URL for one page of a search
///
/// # Example
///
/// ```
/// use sumi_listings::config::SortOrder;
/// use sumi_listings::crawler::build_search_url;
///
/// let url = build_search_url("https://www.yellowpages.com/", "pizza", "Austin, TX", 2, SortOrder::Rating).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.yellowpages.com/search?search_terms=pizza&geo_location_terms=Austin%2C+TX&page=2&sort=rating"
/// );
/// ```
pub fn build_search_url(
    base_url: &str,
    keyword: &str,
    location: &str,
    page: u32,
    sort_order: SortOrder,
) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/search", base_url.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("search_terms", keyword)
        .append_pair("geo_location_terms", location)
        .append_pair("page", &page.to_string())
        .append_pair("sort", sort_order.code());
    Ok(url)
}

/// Estimates how many pages are worth fetching, from the first page's yield
///
/// `ceil(max_results / max(first_page_records, ASSUMED_RESULTS_PER_PAGE))`,
/// clamped to `1..=max_pages_per_search`. An empty first page gives 1.
pub fn estimate_page_budget(
    first_page_records: usize,
    max_results: usize,
    max_pages_per_search: u32,
) -> u32 {
    if first_page_records == 0 {
        return 1;
    }

    let per_page = first_page_records.max(ASSUMED_RESULTS_PER_PAGE);
    let pages_for_max = max_results.div_ceil(per_page);
    let ceiling = max_pages_per_search.max(1);
    u32::try_from(pages_for_max).unwrap_or(u32::MAX).clamp(1, ceiling)
}

/// Runs one search page by page until a stop condition holds
///
/// A page whose fetch is exhausted is skipped and does not stop the search.
///
/// # Errors
///
/// Returns [`ListingsError::UrlParse`] if a search URL cannot be built from the
/// configured base URL.
pub async fn crawl_search(
    client: &Client,
    settings: &Settings,
    request: &CrawlRequest,
    events: &dyn CrawlEvents,
) -> Result<SearchOutcome, ListingsError> {
    let policy = RetryPolicy::from_settings(settings);
    let ceiling = settings.max_pages_per_search;

    let mut outcome = SearchOutcome {
        records: Vec::new(),
        pages_fetched: 0,
        pages_skipped: 0,
        listings_skipped: 0,
        estimated_budget: None,
        stop_reason: StopReason::CeilingReached,
    };
    let mut last_page = 0;

    for page in 1..=ceiling {
        if outcome.records.len() >= request.max_results {
            outcome.stop_reason = StopReason::TargetReached;
            break;
        }
        last_page = page;

        let url = build_search_url(
            &settings.base_url,
            &request.keyword,
            &request.location,
            page,
            request.sort_order,
        )?;

        let body = match fetch_with_retry(client, url.as_str(), &policy, events).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::Exhausted { attempts, .. } => {
                outcome.pages_skipped += 1;
                events.record(CrawlEvent::PageSkipped {
                    keyword: request.keyword.clone(),
                    location: request.location.clone(),
                    page,
                    attempts,
                });
                continue;
            }
        };

        let extraction = extract_page(&body);
        outcome.pages_fetched += 1;
        outcome.listings_skipped += extraction.skipped_count();

        for skipped in &extraction.skipped {
            events.record(CrawlEvent::ListingSkipped {
                page,
                position: skipped.position,
                reason: skipped.reason,
            });
        }
        events.record(CrawlEvent::PageParsed {
            keyword: request.keyword.clone(),
            location: request.location.clone(),
            page,
            records: extraction.records.len(),
        });

        if page == 1 && outcome.estimated_budget.is_none() {
            let pages = estimate_page_budget(extraction.records.len(), request.max_results, ceiling);
            outcome.estimated_budget = Some(pages);
            events.record(CrawlEvent::BudgetEstimated {
                first_page_records: extraction.records.len(),
                pages,
            });
        }

        let page_was_empty = extraction.is_empty();
        outcome.records.extend(extraction.records);

        if page_was_empty {
            outcome.stop_reason = StopReason::DirectoryExhausted;
            break;
        }
        if outcome.records.len() >= request.max_results {
            outcome.stop_reason = StopReason::TargetReached;
            break;
        }
        if outcome.estimated_budget.is_some_and(|budget| page >= budget) {
            outcome.stop_reason = StopReason::BudgetReached;
            break;
        }
    }

    outcome.records.truncate(request.max_results);
    events.record(CrawlEvent::SearchStopped {
        keyword: request.keyword.clone(),
        location: request.location.clone(),
        page: last_page,
        reason: outcome.stop_reason,
    });

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::events::CollectedEvents;
    use crate::crawler::fetcher::build_http_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn listings_page(prefix: &str, count: usize) -> String {
        let listings: String = (0..count)
            .map(|i| {
                format!(
                    r#"<div class="result"><a class="business-name">{} {}</a></div>"#,
                    prefix, i
                )
            })
            .collect();
        format!("<html><body>{}</body></html>", listings)
    }

    fn test_settings(base_url: &str, max_pages: u32, retry_attempts: u32) -> Settings {
        Settings {
            base_url: base_url.to_string(),
            max_pages_per_search: max_pages,
            retry_attempts,
            retry_backoff_seconds: 0.0,
            ..Settings::default()
        }
    }

    fn request(max_results: usize) -> CrawlRequest {
        CrawlRequest {
            keyword: "pizza".to_string(),
            location: "Austin, TX".to_string(),
            max_results,
            sort_order: SortOrder::BestMatch,
        }
    }

    #[test]
    fn test_estimate_uses_assumed_page_size() {
        assert_eq!(estimate_page_budget(5, 10, 5), 1);
        assert_eq!(estimate_page_budget(5, 100, 5), 4);
        assert_eq!(estimate_page_budget(40, 100, 5), 3);
    }

    #[test]
    fn test_estimate_is_clamped() {
        assert_eq!(estimate_page_budget(30, 1000, 5), 5);
        assert_eq!(estimate_page_budget(30, 0, 5), 1);
        assert_eq!(estimate_page_budget(0, 50, 5), 1);
    }

    #[test]
    fn test_build_search_url_encodes_terms() {
        let url = build_search_url(
            "http://127.0.0.1:8080",
            "auto repair",
            "St. Paul, MN",
            1,
            SortOrder::from_name("unknown"),
        )
        .unwrap();
        assert_eq!(url.path(), "/search");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("search_terms".to_string(), "auto repair".to_string()),
                ("geo_location_terms".to_string(), "St. Paul, MN".to_string()),
                ("page".to_string(), "1".to_string()),
                ("sort".to_string(), "best".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_stops_after_estimated_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("Shop", 5)))
            .expect(1)
            .mount(&server)
            .await;

        let settings = test_settings(&server.uri(), 5, 1);
        let client = build_http_client(&settings).unwrap();
        let events = CollectedEvents::new();

        let outcome = crawl_search(&client, &settings, &request(10), &events)
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 5);
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.estimated_budget, Some(1));
        assert_eq!(outcome.stop_reason, StopReason::BudgetReached);
    }

    #[tokio::test]
    async fn test_empty_page_stops_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("A", 30)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("B", 0)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("C", 30)))
            .expect(0)
            .mount(&server)
            .await;

        let settings = test_settings(&server.uri(), 5, 1);
        let client = build_http_client(&settings).unwrap();
        let events = CollectedEvents::new();

        let outcome = crawl_search(&client, &settings, &request(100), &events)
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 30);
        assert_eq!(outcome.estimated_budget, Some(4));
        assert_eq!(outcome.stop_reason, StopReason::DirectoryExhausted);
    }

    #[tokio::test]
    async fn test_exhausted_page_is_skipped_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("Page2", 30)))
            .expect(1)
            .mount(&server)
            .await;

        let settings = test_settings(&server.uri(), 2, 3);
        let client = build_http_client(&settings).unwrap();
        let events = CollectedEvents::new();

        let outcome = crawl_search(&client, &settings, &request(50), &events)
            .await
            .unwrap();

        assert_eq!(outcome.pages_skipped, 1);
        assert_eq!(outcome.pages_fetched, 1);
        assert_eq!(outcome.records.len(), 30);
        assert_eq!(outcome.records[0].name, "Page2 0");
        assert_eq!(outcome.estimated_budget, None);
        assert_eq!(outcome.stop_reason, StopReason::CeilingReached);
        assert_eq!(
            events.count(|e| matches!(e, CrawlEvent::PageSkipped { page: 1, attempts: 3, .. })),
            1
        );
    }

    #[tokio::test]
    async fn test_records_truncated_to_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(listings_page("Cafe", 30)))
            .expect(1)
            .mount(&server)
            .await;

        let settings = test_settings(&server.uri(), 5, 1);
        let client = build_http_client(&settings).unwrap();
        let events = CollectedEvents::new();

        let outcome = crawl_search(&client, &settings, &request(12), &events)
            .await
            .unwrap();

        assert_eq!(outcome.records.len(), 12);
        assert_eq!(outcome.records[11].name, "Cafe 11");
        assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    }

    #[tokio::test]
    async fn test_zero_max_results_fetches_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let settings = test_settings(&server.uri(), 5, 1);
        let client = build_http_client(&settings).unwrap();
        let events = CollectedEvents::new();

        let outcome = crawl_search(&client, &settings, &request(0), &events)
            .await
            .unwrap();
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::TargetReached);
    }
}
