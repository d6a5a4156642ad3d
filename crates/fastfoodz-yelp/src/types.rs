//! Yelp Fusion request and response types.

use fastfoodz_core::{Category, Coordinate};
use serde::Deserialize;

/// Default number of results requested per search.
pub const DEFAULT_LIMIT: u32 = 20;

/// Default search radius in meters.
pub const DEFAULT_RADIUS_METERS: u32 = 1_000;

/// Parameters for one `GET /v3/businesses/search` request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub coordinate: Coordinate,
    pub categories: Vec<Category>,
    pub limit: u32,
    pub radius_meters: u32,
}

impl SearchQuery {
    /// A query around `coordinate` using the default limit and radius.
    #[must_use]
    pub fn new(coordinate: Coordinate, categories: Vec<Category>) -> Self {
        Self {
            coordinate,
            categories,
            limit: DEFAULT_LIMIT,
            radius_meters: DEFAULT_RADIUS_METERS,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn with_radius(mut self, radius_meters: u32) -> Self {
        self.radius_meters = radius_meters;
        self
    }

    /// The `categories` query value: aliases joined with commas.
    /// [`Category::Unknown`] is never sent.
    #[must_use]
    pub fn categories_param(&self) -> String {
        self.categories
            .iter()
            .filter(|c| **c != Category::Unknown)
            .map(|c| c.alias())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Top-level search response.
///
/// Individual businesses stay as raw JSON so one odd record cannot fail the
/// whole page; [`crate::normalize::normalize_business`] maps each one.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub businesses: Vec<serde_json::Value>,
}

/// Error envelope returned with non-2xx statuses:
/// `{ "error": { "code": "...", "description": "..." } }`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}
