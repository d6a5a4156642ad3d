use thiserror::Error;

/// Errors returned by a single place search.
///
/// `Clone` so one failed request can be reported to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The request URL could not be built (e.g. a non-finite coordinate).
    #[error("could not construct search request: {0}")]
    RequestConstructionFailed(String),

    /// Network failure, timeout, or non-2xx HTTP status.
    #[error("search request failed: {0}")]
    TransportFailed(String),

    /// The body was not a JSON object with a `businesses` array.
    #[error("malformed search response: {0}")]
    MalformedResponse(String),
}

impl SearchError {
    /// The error reported when a search exceeds its deadline.
    #[must_use]
    pub fn timeout() -> Self {
        SearchError::TransportFailed("timeout".to_string())
    }
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SearchError::timeout()
        } else {
            SearchError::TransportFailed(err.to_string())
        }
    }
}
