//! Sumi-Listings main entry point
//!
//! This is the command-line interface for the Sumi-Listings directory harvester.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_listings::config::{load_input_with_hash, load_settings_or_default, SearchInput, Settings};
use sumi_listings::crawler::{build_search_url, plan_searches, run_crawl, TracingEvents};
use sumi_listings::output::{print_statistics, write_records};
use tracing_subscriber::EnvFilter;

/// Sumi-Listings: a tolerant business-directory harvester
///
/// Sumi-Listings runs every (keyword, location) search of an input file against
/// a business directory, extracts business records from the result pages, and
/// writes them out as JSON or CSV.
#[derive(Parser, Debug)]
#[command(name = "sumi-listings")]
#[command(version = "1.0.0")]
#[command(about = "A tolerant business-directory harvester", long_about = None)]
struct Cli {
    /// Path to the JSON input (keywords, locations, limits, output format)
    #[arg(short, long, default_value = "data/inputs.sample.json")]
    input: PathBuf,

    /// Where to write the collected records
    #[arg(short, long, default_value = "data/output.json")]
    output: PathBuf,

    /// Path to the JSON settings file; defaults apply when it is missing
    #[arg(short, long, default_value = "config/settings.json")]
    settings: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and show the planned searches without fetching
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading input from: {}", cli.input.display());
    let (input, input_hash) = load_input_with_hash(&cli.input)
        .with_context(|| format!("cannot load input {}", cli.input.display()))?;
    tracing::info!("Input loaded successfully (hash: {})", input_hash);

    let settings = load_settings_or_default(&cli.settings)
        .with_context(|| format!("cannot load settings {}", cli.settings.display()))?;

    if cli.dry_run {
        return handle_dry_run(&input, &settings, &cli.output);
    }

    handle_crawl(input, settings, &cli.output).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_listings=info,warn"),
            1 => EnvFilter::new("sumi_listings=debug,info"),
            2 => EnvFilter::new("sumi_listings=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows what would be fetched
fn handle_dry_run(
    input: &SearchInput,
    settings: &Settings,
    output: &std::path::Path,
) -> anyhow::Result<()> {
    println!("=== Sumi-Listings Dry Run ===\n");

    println!("Settings:");
    println!("  Base URL: {}", settings.base_url);
    println!("  User agent: {}", settings.user_agent);
    println!("  Timeout: {}s", settings.timeout_seconds);
    println!("  Max pages per search: {}", settings.max_pages_per_search);
    println!(
        "  Retries: {} attempts, {}s base backoff",
        settings.retry_attempts, settings.retry_backoff_seconds
    );
    println!(
        "  Concurrent searches: {}",
        settings.max_concurrent_searches
    );

    println!("\nInput:");
    println!("  Max results per search: {}", input.max_results_per_keyword);
    println!("  Sort: {}", input.sort_by.code());
    println!("  Output: {} ({})", output.display(), input.output_format);

    let plan = plan_searches(input);
    println!("\nPlanned Searches ({}):", plan.len());
    for request in &plan {
        let url = build_search_url(
            &settings.base_url,
            &request.keyword,
            &request.location,
            1,
            request.sort_order,
        )
        .context("base URL cannot form a search URL")?;
        println!("  - '{}' in '{}'", request.keyword, request.location);
        println!("    * {}", url);
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    input: SearchInput,
    settings: Settings,
    output: &std::path::Path,
) -> anyhow::Result<()> {
    tracing::info!(
        "Keywords: {}, Locations: {}, Output: {} ({})",
        input.keywords.len(),
        input.locations.len(),
        output.display(),
        input.output_format
    );

    let report = run_crawl(&input, settings, Arc::new(TracingEvents))
        .await
        .context("crawl could not start")?;

    write_records(&report.records, output, input.output_format)
        .with_context(|| format!("cannot write output {}", output.display()))?;

    print_statistics(&report);
    Ok(())
}
