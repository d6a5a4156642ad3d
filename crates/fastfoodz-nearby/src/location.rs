//! Shared holder for the device's best-known location.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use fastfoodz_core::Coordinate;
use tokio::sync::mpsc;

type Handler = Arc<dyn Fn(Coordinate) + Send + Sync>;

/// Handle returned by [`LocationState::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Current device location plus the observers interested in it.
///
/// Constructed explicitly and shared by reference (usually behind an `Arc`);
/// there is no global instance. Absent location is `None`, never an error.
pub struct LocationState {
    current: RwLock<Option<Coordinate>>,
    subscribers: Mutex<Vec<(SubscriptionId, Handler)>>,
    next_id: AtomicU64,
}

impl Default for LocationState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocationState")
            .field("current", &self.get())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LocationState {
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            subscribers: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// The last coordinate passed to [`set`](Self::set), if any.
    #[must_use]
    pub fn get(&self) -> Option<Coordinate> {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `coordinate` and calls every subscriber with it, in
    /// registration order, on the calling thread.
    ///
    /// Subscribers are notified on every call, including repeats of the
    /// current value. Handlers run outside the internal locks, so they may
    /// call back into this state.
    pub fn set(&self, coordinate: Coordinate) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(coordinate);

        let handlers: Vec<Handler> = self
            .lock_subscribers()
            .iter()
            .map(|(_, h)| Arc::clone(h))
            .collect();

        tracing::debug!(
            latitude = coordinate.latitude,
            longitude = coordinate.longitude,
            subscribers = handlers.len(),
            "location updated"
        );
        for handler in handlers {
            handler(coordinate);
        }
    }

    /// Registers `handler` to be called on every location update.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(Coordinate) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock_subscribers().push((id, Arc::new(handler)));
        id
    }

    /// Registers a subscriber that forwards each update into a channel.
    ///
    /// The subscription stays registered until [`unsubscribe`](Self::unsubscribe)
    /// is called; updates sent after the receiver is dropped are discarded.
    pub fn subscribe_channel(&self) -> (SubscriptionId, mpsc::UnboundedReceiver<Coordinate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.subscribe(move |coordinate| {
            // Receiver gone means the consumer was torn down.
            let _ = tx.send(coordinate);
        });
        (id, rx)
    }

    /// Removes a subscriber. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.lock_subscribers();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
