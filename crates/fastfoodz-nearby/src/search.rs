//! The seam between the cache and whatever performs the remote search.

use std::future::Future;
use std::sync::Arc;

use fastfoodz_core::Place;
use fastfoodz_yelp::{SearchError, SearchQuery, YelpClient};

/// Performs one remote place search. Implementations must not retry.
pub trait PlaceSearch: Send + Sync + 'static {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Place>, SearchError>> + Send;
}

impl PlaceSearch for YelpClient {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Place>, SearchError>> + Send {
        YelpClient::search(self, query)
    }
}

impl<T: PlaceSearch> PlaceSearch for Arc<T> {
    fn search(
        &self,
        query: &SearchQuery,
    ) -> impl Future<Output = Result<Vec<Place>, SearchError>> + Send {
        T::search(&**self, query)
    }
}
