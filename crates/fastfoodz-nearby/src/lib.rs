//! Location-gated, single-flight fetching of nearby places.
//!
//! [`LocationState`] holds the device's last known coordinate and notifies
//! subscribers on every update. [`PlaceFetchCache`] collapses concurrent
//! requests into one search, fans the result out to every waiter, and serves
//! repeat callers from memory.

pub mod cache;
pub mod error;
pub mod location;
pub mod search;

pub use cache::{CacheOptions, CachePhase, PlaceFetchCache, Places};
pub use error::FetchError;
pub use location::{LocationState, SubscriptionId};
pub use search::PlaceSearch;
pub use tokio_util::sync::CancellationToken;
