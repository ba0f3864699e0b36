//! Text and selector helpers shared by the field extractors

use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("hardcoded regex pattern is valid"));

/// Collapses runs of whitespace into single spaces and trims both ends
pub fn clean_text(value: &str) -> String {
    WHITESPACE.replace_all(value, " ").trim().to_string()
}

/// All descendant text nodes joined with a single space, then cleaned
pub fn flatten_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text directly beneath an element, cleaned (`<a>Joe's <b>Pizza</b></a>` → `Joe's Pizza`)
pub fn element_text(element: &ElementRef) -> String {
    clean_text(&element.text().collect::<String>())
}

/// First descendant of `fragment` matching `css`
///
/// Selectors are static strings; an unparsable one simply matches nothing.
pub fn select_first<'a>(fragment: &ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    fragment.select(&selector).next()
}

/// All descendants of `fragment` matching `css`, in document order
pub fn select_all<'a>(fragment: &ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => fragment.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// True if any class token of `element` contains one of `markers` as a substring
pub fn has_class_containing(element: &ElementRef, markers: &[&str]) -> bool {
    element
        .value()
        .classes()
        .any(|class| markers.iter().any(|marker| class.contains(marker)))
}

/// Keeps the first occurrence of each item, preserving order
pub fn dedup_preserving_order<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + std::hash::Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}
