//! Listing extraction
//!
//! This module turns directory markup into [`BusinessRecord`]s:
//! - `fields` holds one extractor per record field, each a chain of fallbacks
//! - `parse_listing` composes them over a single listing fragment
//! - `extract_page` finds every listing on a results page

mod fields;
mod page;
mod record;
mod text;

pub use fields::{
    extract_address, extract_categories, extract_email, extract_email_from_text,
    extract_gallery, extract_general_info, extract_hours, extract_name, extract_phone,
    extract_ratings, extract_reviews, extract_website, first_match, parse_hours_line, Strategy,
    GALLERY_HOST_MARKERS,
};
pub use page::{
    extract_page, find_listing_fragments, PageExtraction, SkippedListing, LISTING_CLASS_MARKERS,
};
pub use record::{BusinessRecord, HoursEntry, Review, DIRECTORY_RATING_SOURCE};
pub use text::clean_text;

use scraper::ElementRef;
use std::fmt;

/// Why a listing fragment produced no record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No business name could be found by any strategy
    MissingName,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingName => write!(f, "no business name found"),
        }
    }
}

/// Result of parsing one listing fragment
#[derive(Debug, Clone, PartialEq)]
pub enum ListingOutcome {
    Parsed(BusinessRecord),
    Skipped(SkipReason),
}

/// Builds a record from one listing fragment
///
/// Individual fields never fail; they fall back to their empty form. The only
/// way a fragment is rejected is when no name can be found for it.
pub fn parse_listing(fragment: &ElementRef) -> ListingOutcome {
    let name = extract_name(fragment);
    if name.is_empty() {
        return ListingOutcome::Skipped(SkipReason::MissingName);
    }

    ListingOutcome::Parsed(BusinessRecord {
        name,
        address: extract_address(fragment),
        phone: extract_phone(fragment),
        email: extract_email(fragment),
        website: extract_website(fragment),
        ratings: extract_ratings(fragment),
        categories: extract_categories(fragment),
        hours: extract_hours(fragment),
        gallery: extract_gallery(fragment),
        yp_reviews: extract_reviews(fragment),
        general_info: extract_general_info(fragment),
    })
}
