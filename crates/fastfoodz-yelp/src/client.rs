//! HTTP client for the Yelp Fusion business search endpoint.
//!
//! Wraps `reqwest` with bearer-token auth, request-URL construction, and
//! lenient mapping of the `businesses` array into [`Place`] values. The client
//! never retries; callers decide whether a failed search is worth repeating.

use std::time::Duration;

use fastfoodz_core::Place;
use reqwest::{Client, StatusCode, Url};

use crate::error::SearchError;
use crate::normalize::normalize_business;
use crate::types::{ErrorResponse, SearchQuery, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://api.yelp.com/";

const SEARCH_PATH: &str = "v3/businesses/search";

const DEFAULT_USER_AGENT: &str = "fastfoodz/0.1 (nearby-places)";

/// Client for the Yelp Fusion search API.
///
/// Use [`YelpClient::new`] for production or [`YelpClient::with_base_url`] to
/// point at a mock server in tests.
pub struct YelpClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl YelpClient {
    /// Creates a client pointed at the production Yelp API.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::RequestConstructionFailed`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, timeout, DEFAULT_BASE_URL, DEFAULT_USER_AGENT)
    }

    /// Creates a client with a custom base URL and `User-Agent`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::RequestConstructionFailed`] if the
    /// `reqwest::Client` cannot be constructed or `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout: Duration,
        base_url: &str,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .user_agent(user_agent)
            .build()
            .map_err(|e| SearchError::RequestConstructionFailed(e.to_string()))?;

        // Exactly one trailing slash so `join` appends the search path instead
        // of replacing the last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            SearchError::RequestConstructionFailed(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Searches for businesses near `query.coordinate`.
    ///
    /// Results keep the server's order. Elements of `businesses` that are not
    /// JSON objects are skipped.
    ///
    /// # Errors
    ///
    /// - [`SearchError::RequestConstructionFailed`] if the coordinate cannot
    ///   be encoded into the request URL.
    /// - [`SearchError::TransportFailed`] on network failure, timeout, or a
    ///   non-2xx status.
    /// - [`SearchError::MalformedResponse`] if the body is not a JSON object
    ///   with a `businesses` array.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<Place>, SearchError> {
        let url = self.build_url(query)?;
        tracing::debug!(%url, "yelp search request");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(Self::status_error(status, &body));
        }

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| SearchError::MalformedResponse(e.to_string()))?;

        let places: Vec<Place> = parsed
            .businesses
            .iter()
            .enumerate()
            .filter_map(|(index, business)| {
                let place = normalize_business(business);
                if place.is_none() {
                    tracing::warn!(index, "yelp search: skipping non-object business entry");
                }
                place
            })
            .collect();

        tracing::info!(
            count = places.len(),
            latitude = query.coordinate.latitude,
            longitude = query.coordinate.longitude,
            "yelp search complete"
        );
        Ok(places)
    }

    /// Builds the search URL with percent-encoded query parameters.
    fn build_url(&self, query: &SearchQuery) -> Result<Url, SearchError> {
        if !query.coordinate.is_valid() {
            return Err(SearchError::RequestConstructionFailed(format!(
                "coordinate out of range: ({}, {})",
                query.coordinate.latitude, query.coordinate.longitude
            )));
        }

        let mut url = self
            .base_url
            .join(SEARCH_PATH)
            .map_err(|e| SearchError::RequestConstructionFailed(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("latitude", &query.coordinate.latitude.to_string())
            .append_pair("longitude", &query.coordinate.longitude.to_string())
            .append_pair("radius", &query.radius_meters.to_string())
            .append_pair("categories", &query.categories_param())
            .append_pair("limit", &query.limit.to_string());
        Ok(url)
    }

    /// Turns a non-2xx response into a transport error, including Yelp's
    /// error code when the body carries one.
    fn status_error(status: StatusCode, body: &str) -> SearchError {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(envelope) => {
                let description = envelope.error.description.unwrap_or_default();
                SearchError::TransportFailed(
                    format!("HTTP {status}: {} {description}", envelope.error.code)
                        .trim_end()
                        .to_string(),
                )
            }
            Err(_) => SearchError::TransportFailed(format!("HTTP {status}")),
        }
    }
}
