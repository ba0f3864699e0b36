//! Page extractor: finds listing fragments in a results page and parses each one

use crate::listing::fields::extract_name;
use crate::listing::record::BusinessRecord;
use crate::listing::text::{has_class_containing, select_all};
use crate::listing::{parse_listing, ListingOutcome, SkipReason};
use scraper::{ElementRef, Html};

/// Class-token markers identifying candidate listing containers
pub const LISTING_CLASS_MARKERS: &[&str] = &["result", "listing"];

/// A listing fragment that did not produce a record
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedListing {
    /// Position of the fragment among the page's listings
    pub position: usize,
    pub reason: SkipReason,
}

/// Everything extracted from one results page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtraction {
    /// Named records in document order
    pub records: Vec<BusinessRecord>,

    /// Fragments that were skipped, with the reason
    pub skipped: Vec<SkippedListing>,
}

impl PageExtraction {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn is_descendant_of(element: &ElementRef, ancestor: &ElementRef) -> bool {
    element.ancestors().any(|node| node.id() == ancestor.id())
}

/// Counts the named candidates inside `container` that are not nested in one another
fn separate_named_inside(
    container: &ElementRef,
    candidates: &[ElementRef],
    named: &[bool],
) -> usize {
    let enclosed: Vec<&ElementRef> = candidates
        .iter()
        .zip(named)
        .filter(|(candidate, is_named)| **is_named && is_descendant_of(candidate, container))
        .map(|(candidate, _)| candidate)
        .collect();

    enclosed
        .iter()
        .filter(|inner| !enclosed.iter().any(|outer| is_descendant_of(inner, outer)))
        .count()
}

/// Locates the listing fragments of a page, in document order
///
/// Candidates are `div`s whose class token contains a listing marker. Two kinds of
/// candidate are not listings:
///
/// - containers, which enclose two or more separate candidates carrying a
///   business name (`<div class="search-results">` around the real listings)
/// - sub-blocks, which sit inside an accepted listing (`<div class="result-rating">`,
///   or a named `<div class="listing-header">`)
pub fn find_listing_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    let root = document.root_element();
    let candidates: Vec<ElementRef> = select_all(&root, "div")
        .into_iter()
        .filter(|div| has_class_containing(div, LISTING_CLASS_MARKERS))
        .collect();

    let named: Vec<bool> = candidates
        .iter()
        .map(|candidate| !extract_name(candidate).is_empty())
        .collect();

    let listings: Vec<ElementRef> = candidates
        .iter()
        .filter(|candidate| separate_named_inside(candidate, &candidates, &named) < 2)
        .copied()
        .collect();

    let mut fragments: Vec<ElementRef> = Vec::with_capacity(listings.len());
    for listing in listings {
        if fragments.iter().any(|kept| is_descendant_of(&listing, kept)) {
            continue;
        }
        fragments.push(listing);
    }
    fragments
}

/// Extracts every named business record from one results page
///
/// Fragments that cannot produce a record are reported in
/// [`PageExtraction::skipped`]; they never abort the page.
///
/// # Example
///
/// ```
/// use sumi_listings::listing::extract_page;
///
/// let html = r#"<div class="result"><a class="business-name">Joe's Pizza</a></div>
///               <div class="result"><p>no name here</p></div>"#;
/// let page = extract_page(html);
/// assert_eq!(page.records.len(), 1);
/// assert_eq!(page.skipped_count(), 1);
/// ```
pub fn extract_page(page_html: &str) -> PageExtraction {
    let document = Html::parse_document(page_html);
    let fragments = find_listing_fragments(&document);
    tracing::debug!("Found {} listing blocks on page", fragments.len());

    let mut extraction = PageExtraction::default();
    for (position, fragment) in fragments.iter().enumerate() {
        match parse_listing(fragment) {
            ListingOutcome::Parsed(record) => extraction.records.push(record),
            ListingOutcome::Skipped(reason) => {
                tracing::debug!("Skipping listing {}: {}", position, reason);
                extraction.skipped.push(SkippedListing { position, reason });
            }
        }
    }
    extraction
}
