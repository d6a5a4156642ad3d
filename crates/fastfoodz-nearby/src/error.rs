use fastfoodz_yelp::SearchError;
use thiserror::Error;

/// Outcome of a failed [`crate::PlaceFetchCache::get_places`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The underlying search failed. The cache is back to empty, so the
    /// caller may try again.
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] SearchError),

    /// The caller's cancellation token fired before a result arrived.
    #[error("fetch cancelled")]
    Cancelled,
}
