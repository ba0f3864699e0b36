//! Output module for exporting crawl results
//!
//! This module handles:
//! - Writing the record set as JSON or CSV
//! - Summarizing a run for display

mod csv_output;
mod json_output;
pub mod stats;

pub use csv_output::write_csv;
pub use json_output::write_json;
pub use stats::{collect_statistics, print_statistics, CrawlStatistics};

use crate::config::OutputFormat;
use crate::listing::BusinessRecord;
use crate::ListingsError;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Writes `records` to `path` in the requested format
///
/// The parent directory is created when missing.
///
/// # Errors
///
/// Returns an IO, JSON or CSV error if the file cannot be written.
pub fn write_records(
    records: &[BusinessRecord],
    path: &Path,
    format: OutputFormat,
) -> Result<(), ListingsError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    tracing::debug!(
        "Exporting {} records to {} at {}",
        records.len(),
        format,
        path.display()
    );

    let writer = BufWriter::new(File::create(path)?);
    match format {
        OutputFormat::Json => write_json(records, writer)?,
        OutputFormat::Csv => write_csv(records, writer)?,
    }

    tracing::info!("Output written to {} ({})", path.display(), format);
    Ok(())
}
