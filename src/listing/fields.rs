//! Field extractors for a single listing fragment
//!
//! Directory markup changes without notice, so every field is read through an
//! ordered list of strategies. A strategy is a pure function from the fragment to
//! an optional value; the first strategy that yields a non-empty value wins. When
//! nothing matches the field degrades to its empty form, it never fails.

use crate::listing::record::{HoursEntry, Review, DIRECTORY_RATING_SOURCE};
use crate::listing::text::{
    clean_text, dedup_preserving_order, element_text, flatten_text, has_class_containing,
    select_all, select_first,
};
use regex::Regex;
use scraper::ElementRef;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

/// One way of reading a field out of a listing fragment
pub type Strategy<T> = fn(&ElementRef) -> Option<T>;

/// Substrings of an image URL that mark it as hosted by the directory
pub const GALLERY_HOST_MARKERS: &[&str] = &["ypcdn.com", "yellowpages"];

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\(?\d{3}\)?\s*[-.]?\s*)?\d{3}\s*[-.]?\s*\d{4}")
        .expect("hardcoded regex pattern is valid")
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
        .expect("hardcoded regex pattern is valid")
});

static STAR_RATING_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?) star rating").expect("hardcoded regex pattern is valid")
});

static STAR_RATING_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*star").expect("hardcoded regex pattern is valid")
});

/// Runs `strategies` in order and returns the first value produced
pub fn first_match<T>(fragment: &ElementRef, strategies: &[Strategy<T>]) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(fragment))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn non_empty_vec<T>(values: Vec<T>) -> Option<Vec<T>> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

// ===== Name =====

const NAME_STRATEGIES: &[Strategy<String>] =
    &[name_from_business_anchor, name_from_itemprop, name_from_heading];

fn name_from_business_anchor(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, "a.business-name").and_then(|a| non_empty(element_text(&a)))
}

fn name_from_itemprop(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, r#"a[itemprop="name"]"#).and_then(|a| non_empty(element_text(&a)))
}

fn name_from_heading(fragment: &ElementRef) -> Option<String> {
    ["h2", "h3"]
        .iter()
        .filter_map(|css| select_first(fragment, css))
        .find_map(|heading| non_empty(element_text(&heading)))
}

/// Business name: the name anchor, an `itemprop="name"` anchor, or the first heading
pub fn extract_name(fragment: &ElementRef) -> String {
    first_match(fragment, NAME_STRATEGIES).unwrap_or_default()
}

// ===== Address =====

const ADDRESS_STRATEGIES: &[Strategy<String>] = &[address_from_parts, address_from_adr];

fn address_from_parts(fragment: &ElementRef) -> Option<String> {
    let parts: Vec<String> = ["div.street-address", "div.locality"]
        .iter()
        .filter_map(|css| select_first(fragment, css))
        .map(|block| element_text(&block))
        .filter(|part| !part.is_empty())
        .collect();

    non_empty(parts.join(", "))
}

fn address_from_adr(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, "p.adr").and_then(|p| non_empty(flatten_text(&p)))
}

/// Street address and locality joined with ", ", or a generic address paragraph
pub fn extract_address(fragment: &ElementRef) -> String {
    first_match(fragment, ADDRESS_STRATEGIES).unwrap_or_default()
}

// ===== Phone =====

const PHONE_STRATEGIES: &[Strategy<String>] =
    &[phone_from_phones_block, phone_from_tel_link, phone_from_text];

fn strip_tel(value: &str) -> String {
    clean_text(&value.replace("tel:", ""))
}

fn phone_from_phones_block(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, "div.phones").and_then(|div| non_empty(strip_tel(&element_text(&div))))
}

fn phone_from_tel_link(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, r#"a[href*="tel:"]"#)
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| non_empty(strip_tel(href)))
}

fn phone_from_text(fragment: &ElementRef) -> Option<String> {
    let text = flatten_text(fragment);
    PHONE
        .find(&text)
        .and_then(|m| non_empty(clean_text(m.as_str())))
}

/// Phone number as printed, with any `tel:` scheme removed
pub fn extract_phone(fragment: &ElementRef) -> String {
    first_match(fragment, PHONE_STRATEGIES).unwrap_or_default()
}

// ===== Email =====

/// First email-looking token in `text`
pub fn extract_email_from_text(text: &str) -> String {
    EMAIL
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// First email-looking token in the fragment's flattened text
pub fn extract_email(fragment: &ElementRef) -> String {
    extract_email_from_text(&flatten_text(fragment))
}

// ===== Website =====

const WEBSITE_STRATEGIES: &[Strategy<String>] = &[website_from_visit_link, website_from_label];

fn website_from_visit_link(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, "a.track-visit-website")
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| non_empty(href.trim().to_string()))
}

fn website_from_label(fragment: &ElementRef) -> Option<String> {
    select_all(fragment, "a[href]")
        .into_iter()
        .find(|a| element_text(a).contains("Website"))
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| non_empty(href.trim().to_string()))
}

/// Raw href of the business website link
pub fn extract_website(fragment: &ElementRef) -> String {
    first_match(fragment, WEBSITE_STRATEGIES).unwrap_or_default()
}

// ===== Ratings =====

const DIRECTORY_RATING_STRATEGIES: &[Strategy<String>] =
    &[rating_from_aria_label, rating_from_text];

/// Rating number out of an `aria-label` such as "4.5 star rating"
fn rating_in_label(element: &ElementRef) -> Option<String> {
    let label = element.value().attr("aria-label")?;
    STAR_RATING_LABEL
        .captures(label)
        .map(|caps| caps[1].to_string())
}

fn rating_from_aria_label(fragment: &ElementRef) -> Option<String> {
    select_all(fragment, "[aria-label]")
        .iter()
        .find_map(rating_in_label)
}

fn rating_from_text(fragment: &ElementRef) -> Option<String> {
    let text = flatten_text(fragment);
    STAR_RATING_TEXT
        .captures(&text)
        .map(|caps| caps[1].to_string())
}

/// Ratings keyed by source; today only the directory's own star rating is read
pub fn extract_ratings(fragment: &ElementRef) -> BTreeMap<String, String> {
    let mut ratings = BTreeMap::new();
    if let Some(rating) = first_match(fragment, DIRECTORY_RATING_STRATEGIES) {
        ratings.insert(DIRECTORY_RATING_SOURCE.to_string(), rating);
    }
    ratings
}

// ===== Categories =====

const CATEGORY_STRATEGIES: &[Strategy<Vec<String>>] =
    &[categories_from_block, categories_from_class];

fn categories_from_block(fragment: &ElementRef) -> Option<Vec<String>> {
    let names = select_all(fragment, "div.categories a")
        .iter()
        .map(element_text)
        .filter(|name| !name.is_empty())
        .collect();
    non_empty_vec(names)
}

fn categories_from_class(fragment: &ElementRef) -> Option<Vec<String>> {
    let names = select_all(fragment, "span, a")
        .iter()
        .filter(|el| has_class_containing(el, &["category"]))
        .map(element_text)
        .filter(|name| !name.is_empty())
        .collect();
    non_empty_vec(names)
}

/// Category names, deduplicated and sorted (case-sensitive, no folding)
pub fn extract_categories(fragment: &ElementRef) -> BTreeSet<String> {
    first_match(fragment, CATEGORY_STRATEGIES)
        .unwrap_or_default()
        .into_iter()
        .collect()
}

// ===== Hours =====

fn hours_block<'a>(fragment: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    select_first(fragment, "div.open-hours").or_else(|| {
        select_all(fragment, "div")
            .into_iter()
            .find(|div| has_class_containing(div, &["hours"]))
    })
}

/// Splits "Mon - Fri: 9:00 am - 6:00 pm" on its first colon
pub fn parse_hours_line(text: &str) -> HoursEntry {
    match text.split_once(':') {
        Some((day, time)) => HoursEntry {
            day: clean_text(day),
            time: clean_text(time),
        },
        None => HoursEntry {
            day: String::new(),
            time: text.to_string(),
        },
    }
}

/// Opening hours in document order, one entry per list item
pub fn extract_hours(fragment: &ElementRef) -> Vec<HoursEntry> {
    let Some(block) = hours_block(fragment) else {
        return Vec::new();
    };

    select_all(&block, "li")
        .iter()
        .map(flatten_text)
        .filter(|text| !text.is_empty())
        .map(|text| parse_hours_line(&text))
        .collect()
}

// ===== Gallery =====

/// Directory-hosted image URLs (`src`, else lazy-load `data-src`), first-seen order
pub fn extract_gallery(fragment: &ElementRef) -> Vec<String> {
    let urls: Vec<String> = select_all(fragment, "img")
        .iter()
        .filter_map(|img| {
            let attrs = img.value();
            attrs
                .attr("src")
                .filter(|src| !src.trim().is_empty())
                .or_else(|| attrs.attr("data-src"))
        })
        .filter(|src| GALLERY_HOST_MARKERS.iter().any(|marker| src.contains(marker)))
        .map(|src| src.to_string())
        .collect();

    dedup_preserving_order(urls, |url| url.clone())
}

// ===== Reviews =====

fn parse_review(block: &ElementRef) -> Review {
    let reviewer = select_first(block, "span.reviewer")
        .map(|span| element_text(&span))
        .unwrap_or_default();

    let review_date = select_first(block, "span.date")
        .or_else(|| select_first(block, "span.review-date"))
        .map(|span| element_text(&span))
        .unwrap_or_default();

    let review_rating = select_all(block, "[aria-label]")
        .iter()
        .find_map(rating_in_label)
        .and_then(|value| value.parse::<f64>().ok())
        .unwrap_or(0.0);

    let review_content = match select_first(block, "p") {
        Some(p) => flatten_text(&p),
        None => flatten_text(block),
    };

    Review {
        reviewer,
        review_date,
        review_rating,
        review_content,
    }
}

/// Embedded reviews, deduplicated by (reviewer, content) keeping the first
pub fn extract_reviews(fragment: &ElementRef) -> Vec<Review> {
    let reviews: Vec<Review> = select_all(fragment, "div")
        .iter()
        .filter(|div| has_class_containing(div, &["review", "ratings"]))
        .map(parse_review)
        .collect();

    dedup_preserving_order(reviews, |review| {
        (review.reviewer.clone(), review.review_content.clone())
    })
}

// ===== General info =====

const GENERAL_INFO_STRATEGIES: &[Strategy<String>] =
    &[general_info_from_block, general_info_after_heading];

fn general_info_from_block(fragment: &ElementRef) -> Option<String> {
    select_first(fragment, "p.body-text")
        .or_else(|| select_first(fragment, "div.general-info"))
        .and_then(|block| non_empty(flatten_text(&block)))
}

fn general_info_after_heading(fragment: &ElementRef) -> Option<String> {
    let heading = select_first(fragment, "h2").or_else(|| select_first(fragment, "h3"))?;
    heading
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "p")
        .and_then(|p| non_empty(flatten_text(&p)))
}

/// Free-text business description
pub fn extract_general_info(fragment: &ElementRef) -> String {
    first_match(fragment, GENERAL_INFO_STRATEGIES).unwrap_or_default()
}
