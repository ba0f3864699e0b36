//! Run statistics
//!
//! Summarizes a [`CrawlReport`] for display after a run.

use crate::crawler::{CrawlReport, StopReason};
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlStatistics {
    pub searches: usize,
    pub failed_searches: usize,
    pub total_records: usize,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub listings_skipped: usize,

    /// How many searches ended for each reason
    pub stop_reasons: HashMap<StopReason, usize>,

    pub duration_seconds: f64,
}

/// Derives statistics from a finished run
pub fn collect_statistics(report: &CrawlReport) -> CrawlStatistics {
    let mut stop_reasons = HashMap::new();
    for reason in report.searches.iter().filter_map(|s| s.stop_reason) {
        *stop_reasons.entry(reason).or_insert(0) += 1;
    }

    CrawlStatistics {
        searches: report.searches.len(),
        failed_searches: report.failed_searches(),
        total_records: report.records.len(),
        pages_fetched: report.pages_fetched(),
        pages_skipped: report.pages_skipped(),
        listings_skipped: report.listings_skipped(),
        stop_reasons,
        duration_seconds: report.duration_seconds(),
    }
}

/// Prints statistics and per-search lines to stdout
pub fn print_statistics(report: &CrawlReport) {
    let stats = collect_statistics(report);

    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Searches: {} ({} failed)", stats.searches, stats.failed_searches);
    println!("  Records collected: {}", stats.total_records);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Pages skipped: {}", stats.pages_skipped);
    println!("  Listings skipped: {}", stats.listings_skipped);
    println!("  Duration: {:.1}s", stats.duration_seconds);
    println!();

    if !stats.stop_reasons.is_empty() {
        println!("Stop Reasons:");
        let mut reasons: Vec<_> = stats.stop_reasons.iter().collect();
        reasons.sort_by(|a, b| b.1.cmp(a.1));
        for (reason, count) in reasons {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    println!("Searches:");
    for search in &report.searches {
        match &search.failure {
            Some(error) => println!(
                "  - '{}' in '{}': FAILED ({})",
                search.keyword, search.location, error
            ),
            None => println!(
                "  - '{}' in '{}': {} records, {} pages ({} skipped)",
                search.keyword,
                search.location,
                search.records,
                search.pages_fetched,
                search.pages_skipped
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::SearchSummary;
    use chrono::{Duration, Utc};

    fn summary(stop_reason: Option<StopReason>, records: usize) -> SearchSummary {
        SearchSummary {
            keyword: "pizza".to_string(),
            location: "Austin, TX".to_string(),
            records,
            pages_fetched: 2,
            pages_skipped: 1,
            listings_skipped: 3,
            stop_reason,
            failure: stop_reason.is_none().then(|| "boom".to_string()),
        }
    }

    #[test]
    fn test_collect_statistics() {
        let started_at = Utc::now();
        let report = CrawlReport {
            records: Vec::new(),
            searches: vec![
                summary(Some(StopReason::BudgetReached), 10),
                summary(Some(StopReason::BudgetReached), 4),
                summary(None, 0),
            ],
            started_at,
            finished_at: started_at + Duration::milliseconds(2500),
        };

        let stats = collect_statistics(&report);
        assert_eq!(stats.searches, 3);
        assert_eq!(stats.failed_searches, 1);
        assert_eq!(stats.pages_fetched, 6);
        assert_eq!(stats.pages_skipped, 3);
        assert_eq!(stats.listings_skipped, 9);
        assert_eq!(stats.stop_reasons.get(&StopReason::BudgetReached), Some(&2));
        assert!((stats.duration_seconds - 2.5).abs() < 0.01);
    }
}
