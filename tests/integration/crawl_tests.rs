//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the directory site and run the
//! full cycle end-to-end: plan, fetch, parse, export.

use std::sync::Arc;
use sumi_listings::config::{OutputFormat, SearchInput, Settings, SortOrder};
use sumi_listings::crawler::{run_crawl, CollectedEvents, CrawlEvent, StopReason};
use sumi_listings::output::write_records;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Renders one result card the way the directory does
fn listing_card(index: usize) -> String {
    format!(
        r#"<div class="result">
             <div class="info">
               <h2 class="n"><a class="business-name" href="/austin-tx/mip/pizza-{index}">Pizza Place {index}</a></h2>
               <div class="result-rating four" aria-label="4 star rating"></div>
               <div class="categories"><a>Pizza</a><a>Restaurants</a></div>
               <div class="phones phone primary">(512) 555-010{index}</div>
               <div class="adr"><div class="street-address">{index} Main St</div><div class="locality">Austin, TX 78701</div></div>
             </div>
           </div>"#
    )
}

fn results_page(good_listings: usize, malformed: usize) -> String {
    let mut body = String::from(r#"<html><body><div class="search-results organic">"#);
    for index in 1..=good_listings {
        body.push_str(&listing_card(index));
    }
    for _ in 0..malformed {
        body.push_str(r#"<div class="result"><div class="phones">(512) 555-0199</div></div>"#);
    }
    body.push_str("</div></body></html>");
    body
}

fn test_input(max_results: usize, output_format: OutputFormat) -> SearchInput {
    SearchInput {
        keywords: vec!["pizza".to_string()],
        locations: vec!["Austin, TX".to_string()],
        max_results_per_keyword: max_results,
        sort_by: SortOrder::BestMatch,
        output_format,
    }
}

fn test_settings(base_url: &str) -> Settings {
    Settings {
        base_url: base_url.to_string(),
        user_agent: "TestBot/1.0".to_string(),
        timeout_seconds: 5,
        max_pages_per_search: 3,
        retry_attempts: 1,
        retry_backoff_seconds: 0.0,
        max_concurrent_searches: 1,
    }
}

async fn mount_page(server: &MockServer, page: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("search_terms", "pizza"))
        .and(query_param("geo_location_terms", "Austin, TX"))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_search() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "1", results_page(5, 1)).await;

    let events = Arc::new(CollectedEvents::new());
    let report = run_crawl(
        &test_input(5, OutputFormat::Json),
        test_settings(&mock_server.uri()),
        events.clone(),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 5);
    assert!(report.records.iter().all(|r| !r.name.is_empty()));
    assert_eq!(report.records[0].name, "Pizza Place 1");
    assert_eq!(report.records[0].phone, "(512) 555-0101");
    assert_eq!(report.records[0].address, "1 Main St, Austin, TX 78701");
    assert_eq!(
        report.records[0].ratings.get("yellowpages").map(String::as_str),
        Some("4")
    );

    assert_eq!(report.pages_fetched(), 1);
    assert_eq!(report.listings_skipped(), 1);
    assert_eq!(
        report.searches[0].stop_reason,
        Some(StopReason::TargetReached)
    );
    assert_eq!(
        events.count(|e| matches!(e, CrawlEvent::ListingSkipped { .. })),
        1
    );
}

#[tokio::test]
async fn test_small_first_page_limits_budget() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "1", results_page(2, 0)).await;

    // Page 2 must never be requested: a 2-record first page against an
    // assumed 30 per page budgets a single page for 20 results
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(2, 0)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let events = Arc::new(CollectedEvents::new());
    let report = run_crawl(
        &test_input(20, OutputFormat::Json),
        test_settings(&mock_server.uri()),
        events.clone(),
    )
    .await
    .unwrap();

    assert_eq!(report.records.len(), 2);
    assert_eq!(
        report.searches[0].stop_reason,
        Some(StopReason::BudgetReached)
    );
    assert!(events
        .events()
        .iter()
        .any(|e| matches!(e, CrawlEvent::BudgetEstimated { pages: 1, .. })));
}

#[tokio::test]
async fn test_crawl_then_export_json_and_csv() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "1", results_page(3, 0)).await;

    let report = run_crawl(
        &test_input(3, OutputFormat::Csv),
        test_settings(&mock_server.uri()),
        Arc::new(CollectedEvents::new()),
    )
    .await
    .unwrap();
    assert_eq!(report.records.len(), 3);

    let dir = TempDir::new().unwrap();

    let json_path = dir.path().join("out").join("records.json");
    write_records(&report.records, &json_path, OutputFormat::Json).unwrap();
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[2]["name"], "Pizza Place 3");
    assert_eq!(json[0]["categories"][0], "Pizza");

    let csv_path = dir.path().join("records.csv");
    write_records(&report.records, &csv_path, OutputFormat::Csv).unwrap();
    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    assert_eq!(&reader.headers().unwrap()[0], "name");
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[1][0], "Pizza Place 2");
}

#[tokio::test]
async fn test_unreachable_pages_yield_empty_run() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let events = Arc::new(CollectedEvents::new());
    let report = run_crawl(
        &test_input(5, OutputFormat::Json),
        test_settings(&mock_server.uri()),
        events.clone(),
    )
    .await
    .unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.pages_skipped(), 3);
    assert_eq!(report.failed_searches(), 0);
    assert_eq!(
        events.count(|e| matches!(e, CrawlEvent::PageSkipped { .. })),
        3
    );
}
