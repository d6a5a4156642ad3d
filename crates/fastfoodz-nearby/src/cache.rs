//! Single-flight, in-memory cache of the most recent nearby-place search.
//!
//! State machine:
//!
//! | From       | Event                     | To                      |
//! |------------|---------------------------|-------------------------|
//! | `Empty`    | `get_places`              | `Fetching`              |
//! | `Fetching` | search succeeds (non-empty) | `Populated`           |
//! | `Fetching` | search fails / empty / invalidated | `Empty`        |
//! | `Populated`| `invalidate` or TTL expiry | `Empty`                |
//!
//! The search runs on its own task, so dropping or cancelling one caller
//! never strands the others waiting on the same request.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use fastfoodz_core::{Category, Coordinate, Place};
use fastfoodz_yelp::types::{DEFAULT_LIMIT, DEFAULT_RADIUS_METERS};
use fastfoodz_yelp::{SearchError, SearchQuery};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::search::PlaceSearch;

/// A cached search result, shared by every caller that receives it.
pub type Places = Arc<[Place]>;

type FetchResult = Result<Places, FetchError>;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for a [`PlaceFetchCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    pub limit: u32,
    pub radius_meters: u32,
    /// Deadline for one search; exceeding it fails the fetch with
    /// `TransportFailed("timeout")`.
    pub timeout: Duration,
    /// How long a populated result stays valid. `None` keeps it for the
    /// lifetime of the cache.
    pub ttl: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            radius_meters: DEFAULT_RADIUS_METERS,
            timeout: DEFAULT_TIMEOUT,
            ttl: None,
        }
    }
}

/// Observable phase of the cache, mainly for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePhase {
    Empty,
    Fetching,
    Populated,
}

enum CacheState {
    Empty,
    Fetching {
        /// Callers waiting on the in-flight search, in arrival order.
        waiters: Vec<oneshot::Sender<FetchResult>>,
        /// Set by `invalidate` while fetching: deliver, but do not store.
        invalidated: bool,
    },
    Populated {
        places: Places,
        fetched_at: Instant,
    },
}

struct Inner<S> {
    search: S,
    options: CacheOptions,
    state: Mutex<CacheState>,
}

/// Fetches nearby places at most once at a time and remembers the result.
///
/// Cloning is cheap; clones share the same state.
pub struct PlaceFetchCache<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for PlaceFetchCache<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: PlaceSearch> PlaceFetchCache<S> {
    #[must_use]
    pub fn new(search: S, options: CacheOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                search,
                options,
                state: Mutex::new(CacheState::Empty),
            }),
        }
    }

    /// Returns places near `coordinate`.
    ///
    /// - Populated: the cached sequence, with no search. The coordinate is
    ///   not compared against the one the cache was filled for.
    /// - Fetching: waits for the in-flight search and receives its result.
    /// - Empty: starts exactly one search and waits for it.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`FetchError::FetchFailed`] if the search fails or times out; the
    ///   cache is left empty so a later call retries.
    /// - [`FetchError::Cancelled`] if `cancel` fires first. The search itself
    ///   keeps running for any other waiters.
    pub async fn get_places(
        &self,
        coordinate: Coordinate,
        categories: &[Category],
        cancel: &CancellationToken,
    ) -> FetchResult {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let rx = {
            let mut state = self.inner.lock_state();
            match &mut *state {
                CacheState::Populated { places, fetched_at }
                    if !self.inner.is_expired(*fetched_at) =>
                {
                    tracing::debug!(count = places.len(), "place cache hit");
                    return Ok(Arc::clone(places));
                }
                CacheState::Fetching { waiters, .. } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    tracing::debug!(waiters = waiters.len(), "joining in-flight place search");
                    rx
                }
                CacheState::Empty | CacheState::Populated { .. } => {
                    let (tx, rx) = oneshot::channel();
                    *state = CacheState::Fetching {
                        waiters: vec![tx],
                        invalidated: false,
                    };
                    let query = SearchQuery::new(coordinate, categories.to_vec())
                        .with_limit(self.inner.options.limit)
                        .with_radius(self.inner.options.radius_meters);
                    self.spawn_search(query);
                    rx
                }
            }
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(FetchError::Cancelled),
            result = rx => result.unwrap_or(Err(FetchError::Cancelled)),
        }
    }

    /// Drops the cached result so the next call searches again. A search
    /// already in flight still answers its waiters but is not stored.
    pub fn invalidate(&self) {
        let mut state = self.inner.lock_state();
        match &mut *state {
            CacheState::Populated { .. } => {
                *state = CacheState::Empty;
                tracing::debug!("place cache invalidated");
            }
            CacheState::Fetching { invalidated, .. } => *invalidated = true,
            CacheState::Empty => {}
        }
    }

    /// The cached places, if populated and not expired.
    #[must_use]
    pub fn cached(&self) -> Option<Places> {
        match &*self.inner.lock_state() {
            CacheState::Populated { places, fetched_at } if !self.inner.is_expired(*fetched_at) => {
                Some(Arc::clone(places))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> CachePhase {
        match &*self.inner.lock_state() {
            CacheState::Empty => CachePhase::Empty,
            CacheState::Fetching { .. } => CachePhase::Fetching,
            CacheState::Populated { fetched_at, .. } if self.inner.is_expired(*fetched_at) => {
                CachePhase::Empty
            }
            CacheState::Populated { .. } => CachePhase::Populated,
        }
    }

    /// Number of callers currently waiting on the in-flight search.
    #[must_use]
    pub fn pending_waiters(&self) -> usize {
        match &*self.inner.lock_state() {
            CacheState::Fetching { waiters, .. } => waiters.len(),
            _ => 0,
        }
    }

    fn spawn_search(&self, query: SearchQuery) {
        let mut in_flight = InFlight {
            inner: Arc::clone(&self.inner),
            settled: false,
        };
        tokio::spawn(async move {
            tracing::info!(
                latitude = query.coordinate.latitude,
                longitude = query.coordinate.longitude,
                categories = %query.categories_param(),
                "starting place search"
            );
            let timeout = in_flight.inner.options.timeout;
            let outcome =
                match tokio::time::timeout(timeout, in_flight.inner.search.search(&query)).await {
                    Ok(result) => result,
                    Err(_) => Err(SearchError::timeout()),
                };
            in_flight.settle(outcome);
        });
    }
}

impl<S> Inner<S> {
    fn lock_state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, fetched_at: Instant) -> bool {
        self.options
            .ttl
            .is_some_and(|ttl| fetched_at.elapsed() >= ttl)
    }

    /// Leaves `Fetching` and answers every waiter in arrival order.
    fn settle(&self, outcome: Result<Vec<Place>, SearchError>) {
        let (waiters, result) = {
            let mut state = self.lock_state();
            let (waiters, invalidated) = match std::mem::replace(&mut *state, CacheState::Empty) {
                CacheState::Fetching {
                    waiters,
                    invalidated,
                } => (waiters, invalidated),
                // Not fetching: nothing is waiting on this outcome.
                other => {
                    *state = other;
                    return;
                }
            };

            let result = match outcome {
                Ok(places) => {
                    let places: Places = places.into();
                    if !places.is_empty() && !invalidated {
                        *state = CacheState::Populated {
                            places: Arc::clone(&places),
                            fetched_at: Instant::now(),
                        };
                    }
                    tracing::info!(
                        count = places.len(),
                        waiters = waiters.len(),
                        cached = !places.is_empty() && !invalidated,
                        "place search settled"
                    );
                    Ok(places)
                }
                Err(err) => {
                    tracing::warn!(error = %err, waiters = waiters.len(), "place search failed");
                    Err(FetchError::FetchFailed(err))
                }
            };
            (waiters, result)
        };

        for waiter in waiters {
            // A dropped receiver is a cancelled caller.
            let _ = waiter.send(result.clone());
        }
    }
}

/// Guarantees the cache leaves `Fetching` even if the search task panics or
/// is aborted by runtime shutdown.
struct InFlight<S> {
    inner: Arc<Inner<S>>,
    settled: bool,
}

impl<S> InFlight<S> {
    fn settle(&mut self, outcome: Result<Vec<Place>, SearchError>) {
        self.settled = true;
        self.inner.settle(outcome);
    }
}

impl<S> Drop for InFlight<S> {
    fn drop(&mut self) {
        if !self.settled {
            self.inner.settle(Err(SearchError::TransportFailed(
                "search task aborted".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use fastfoodz_core::PriceTier;
    use tokio::sync::Semaphore;

    use super::*;

    /// Scripted search backend. Each call pops the next response (or
    /// repeats the default) and optionally waits on a gate first.
    struct MockSearch {
        calls: AtomicUsize,
        gate: Option<Arc<Semaphore>>,
        responses: Mutex<VecDeque<Result<Vec<Place>, SearchError>>>,
        queries: Mutex<Vec<SearchQuery>>,
    }

    impl MockSearch {
        fn new(responses: Vec<Result<Vec<Place>, SearchError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: None,
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            })
        }

        fn gated(
            responses: Vec<Result<Vec<Place>, SearchError>>,
        ) -> (Arc<Self>, Arc<Semaphore>) {
            let gate = Arc::new(Semaphore::new(0));
            let mock = Arc::new(Self {
                calls: AtomicUsize::new(0),
                gate: Some(Arc::clone(&gate)),
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            });
            (mock, gate)
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl PlaceSearch for MockSearch {
        fn search(
            &self,
            query: &SearchQuery,
        ) -> impl Future<Output = Result<Vec<Place>, SearchError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(vec![burger_place()]));
            let gate = self.gate.clone();
            async move {
                if let Some(gate) = gate {
                    let _permit = gate.acquire().await;
                }
                response
            }
        }
    }

    fn burger_place() -> Place {
        Place {
            name: Some("Test Burgers".to_owned()),
            price_tier: Some(PriceTier::new("$$")),
            ..Place::with_category(Category::Burgers)
        }
    }

    fn here() -> Coordinate {
        Coordinate::new(37.0, -122.0)
    }

    async fn wait_for_waiters<S: PlaceSearch>(cache: &PlaceFetchCache<S>, n: usize) {
        for _ in 0..1_000 {
            if cache.pending_waiters() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {n} waiters, have {}", cache.pending_waiters());
    }

    #[tokio::test]
    async fn first_call_searches_and_populates() {
        let mock = MockSearch::new(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        assert_eq!(cache.phase(), CachePhase::Empty);

        let places = cache
            .get_places(here(), &[Category::Burgers], &CancellationToken::new())
            .await
            .expect("search should succeed");

        assert_eq!(&*places, &[burger_place()]);
        assert_eq!(cache.phase(), CachePhase::Populated);
        assert_eq!(mock.calls(), 1);

        let query = mock.queries.lock().unwrap()[0].clone();
        assert_eq!(query.coordinate, here());
        assert_eq!(query.categories, vec![Category::Burgers]);
        assert_eq!(query.limit, 20);
        assert_eq!(query.radius_meters, 1_000);
    }

    #[tokio::test]
    async fn populated_cache_serves_identical_sequence_without_searching() {
        let mock = MockSearch::new(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        let token = CancellationToken::new();

        let first = cache.get_places(here(), &[], &token).await.unwrap();
        let second = cache
            .get_places(Coordinate::new(40.0, -74.0), &[], &token)
            .await
            .unwrap();
        let third = cache.get_places(here(), &[], &token).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_search() {
        let (mock, gate) = MockSearch::gated(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());

        let c1 = cache.clone();
        let first = tokio::spawn(async move {
            c1.get_places(here(), &[Category::Burgers], &CancellationToken::new())
                .await
        });
        wait_for_waiters(&cache, 1).await;

        let c2 = cache.clone();
        let second = tokio::spawn(async move {
            c2.get_places(here(), &[Category::Burgers], &CancellationToken::new())
                .await
        });
        wait_for_waiters(&cache, 2).await;
        assert_eq!(cache.phase(), CachePhase::Fetching);

        gate.add_permits(1);
        let first = first.await.unwrap().unwrap();
        let second = second.await.unwrap().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.calls(), 1, "exactly one underlying search");
    }

    #[tokio::test]
    async fn failure_resets_to_empty_and_next_call_retries() {
        let mock = MockSearch::new(vec![Err(SearchError::TransportFailed(
            "connection reset".to_owned(),
        ))]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        let token = CancellationToken::new();

        let err = cache.get_places(here(), &[], &token).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::FetchFailed(SearchError::TransportFailed("connection reset".to_owned()))
        );
        assert_eq!(cache.phase(), CachePhase::Empty);

        let places = cache.get_places(here(), &[], &token).await.unwrap();
        assert_eq!(places.len(), 1);
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn failure_is_fanned_out_to_every_waiter() {
        let (mock, gate) = MockSearch::gated(vec![Err(SearchError::MalformedResponse(
            "missing businesses".to_owned(),
        ))]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());

        let c1 = cache.clone();
        let first =
            tokio::spawn(async move { c1.get_places(here(), &[], &CancellationToken::new()).await });
        wait_for_waiters(&cache, 1).await;
        let c2 = cache.clone();
        let second =
            tokio::spawn(async move { c2.get_places(here(), &[], &CancellationToken::new()).await });
        wait_for_waiters(&cache, 2).await;

        gate.add_permits(1);
        assert!(matches!(
            first.await.unwrap(),
            Err(FetchError::FetchFailed(SearchError::MalformedResponse(_)))
        ));
        assert!(matches!(
            second.await.unwrap(),
            Err(FetchError::FetchFailed(SearchError::MalformedResponse(_)))
        ));
        assert_eq!(mock.calls(), 1);
        assert_eq!(cache.phase(), CachePhase::Empty);
    }

    #[tokio::test]
    async fn empty_result_is_returned_but_not_cached() {
        let mock = MockSearch::new(vec![Ok(vec![])]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        let token = CancellationToken::new();

        let places = cache.get_places(here(), &[], &token).await.unwrap();
        assert!(places.is_empty());
        assert_eq!(cache.phase(), CachePhase::Empty);

        cache.get_places(here(), &[], &token).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_new_search() {
        let mock = MockSearch::new(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        let token = CancellationToken::new();

        cache.get_places(here(), &[], &token).await.unwrap();
        cache.invalidate();
        assert_eq!(cache.phase(), CachePhase::Empty);
        assert!(cache.cached().is_none());

        cache.get_places(here(), &[], &token).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn invalidate_during_fetch_delivers_but_does_not_store() {
        let (mock, gate) = MockSearch::gated(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());

        let c1 = cache.clone();
        let waiter =
            tokio::spawn(async move { c1.get_places(here(), &[], &CancellationToken::new()).await });
        wait_for_waiters(&cache, 1).await;

        cache.invalidate();
        gate.add_permits(1);

        assert_eq!(waiter.await.unwrap().unwrap().len(), 1);
        assert_eq!(cache.phase(), CachePhase::Empty);
    }

    #[tokio::test]
    async fn zero_ttl_expires_immediately() {
        let mock = MockSearch::new(vec![]);
        let options = CacheOptions {
            ttl: Some(Duration::ZERO),
            ..CacheOptions::default()
        };
        let cache = PlaceFetchCache::new(Arc::clone(&mock), options);
        let token = CancellationToken::new();

        cache.get_places(here(), &[], &token).await.unwrap();
        assert!(cache.cached().is_none());
        cache.get_places(here(), &[], &token).await.unwrap();
        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn slow_search_times_out_as_transport_failure() {
        let (mock, _gate) = MockSearch::gated(vec![]);
        let options = CacheOptions {
            timeout: Duration::from_millis(20),
            ..CacheOptions::default()
        };
        let cache = PlaceFetchCache::new(Arc::clone(&mock), options);

        let err = cache
            .get_places(here(), &[], &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::FetchFailed(SearchError::timeout()));
        assert_eq!(cache.phase(), CachePhase::Empty);
    }

    #[tokio::test]
    async fn cancelled_caller_gets_no_result_but_others_do() {
        let (mock, gate) = MockSearch::gated(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());

        let torn_down = CancellationToken::new();
        let c1 = cache.clone();
        let t1 = torn_down.clone();
        let cancelled = tokio::spawn(async move { c1.get_places(here(), &[], &t1).await });
        wait_for_waiters(&cache, 1).await;

        let c2 = cache.clone();
        let survivor =
            tokio::spawn(async move { c2.get_places(here(), &[], &CancellationToken::new()).await });
        wait_for_waiters(&cache, 2).await;

        torn_down.cancel();
        assert_eq!(cancelled.await.unwrap(), Err(FetchError::Cancelled));

        gate.add_permits(1);
        assert_eq!(survivor.await.unwrap().unwrap().len(), 1);
        assert_eq!(cache.phase(), CachePhase::Populated);
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn already_cancelled_token_does_not_start_a_search() {
        let mock = MockSearch::new(vec![]);
        let cache = PlaceFetchCache::new(Arc::clone(&mock), CacheOptions::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = cache.get_places(here(), &[], &token).await;
        assert_eq!(result, Err(FetchError::Cancelled));
        assert_eq!(mock.calls(), 0);
        assert_eq!(cache.phase(), CachePhase::Empty);
    }
}
