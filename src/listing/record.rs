//! Normalized business record produced from one listing fragment

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Rating source key for ratings found on the crawled directory itself
pub const DIRECTORY_RATING_SOURCE: &str = "yellowpages";

/// One business, always fully shaped: missing data is an empty value, never absent
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessRecord {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,

    /// Rating source name → rating value as found
    pub ratings: BTreeMap<String, String>,

    /// Deduplicated, lexicographically sorted
    pub categories: BTreeSet<String>,

    /// Opening hours in document order
    pub hours: Vec<HoursEntry>,

    /// Image URLs in first-seen order
    pub gallery: Vec<String>,

    #[serde(rename = "ypReviews")]
    pub yp_reviews: Vec<Review>,

    #[serde(rename = "generalInfo")]
    pub general_info: String,
}

/// A single opening-hours line, split on its first colon
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoursEntry {
    pub day: String,
    pub time: String,
}

/// A review embedded in a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub reviewer: String,
    pub review_date: String,
    pub review_rating: f64,
    pub review_content: String,
}
