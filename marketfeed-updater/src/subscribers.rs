//! Subscriber registry for published updates.
//!
//! Callbacks are held in an unordered set; no delivery order is promised.
//! `notify` snapshots the set before invoking anything, so a callback may
//! subscribe or unsubscribe (itself included) without deadlocking. Such changes
//! take effect from the next notification.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use tracing::debug;

/// Identifier of a registered callback.
pub type SubscriberId = u64;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    callbacks: RwLock<HashMap<SubscriberId, Callback<T>>>,
    next_id: AtomicU64,
}

/// Removal half of the registry, erased so handles are not generic.
trait Detach: Send + Sync {
    fn detach(&self, id: SubscriberId) -> bool;
}

impl<T: 'static> Detach for Registry<T> {
    fn detach(&self, id: SubscriberId) -> bool {
        self.callbacks.write().remove(&id).is_some()
    }
}

/// Set of callbacks notified with every payload of type `T`.
///
/// Cloning yields another handle to the same set.
pub struct Subscribers<T> {
    inner: Arc<Registry<T>>,
}

impl<T: 'static> Subscribers<T> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Registry {
                callbacks: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a callback and returns the handle that removes it.
    ///
    /// Dropping the handle does not unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.callbacks.write().insert(id, Arc::new(callback));
        debug!(id, "Subscriber registered");

        let registry: Weak<dyn Detach> = Arc::downgrade(&self.inner) as Weak<dyn Detach>;
        Subscription { id, registry }
    }

    /// Invokes every registered callback with `payload`.
    ///
    /// Returns the number of callbacks invoked.
    pub fn notify(&self, payload: &T) -> usize {
        let snapshot: Vec<Callback<T>> = self.inner.callbacks.read().values().cloned().collect();

        for callback in &snapshot {
            callback(payload);
        }

        snapshot.len()
    }

    /// Returns the number of registered callbacks.
    pub fn len(&self) -> usize {
        self.inner.callbacks.read().len()
    }

    /// Returns true if nothing is subscribed.
    pub fn is_empty(&self) -> bool {
        self.inner.callbacks.read().is_empty()
    }
}

impl<T: 'static> Default for Subscribers<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subscribers<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.inner.callbacks.read().len())
            .finish()
    }
}

/// Handle returned by [`Subscribers::subscribe`].
///
/// Holds only a weak reference, so it never keeps the registry alive.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Identifier of the registered callback.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Removes the callback.
    ///
    /// Idempotent: returns true only for the call that actually removed it, and
    /// false once the registry itself is gone.
    pub fn unsubscribe(&self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .map(|registry| registry.detach(self.id))
            .unwrap_or(false);

        if removed {
            debug!(id = self.id, "Subscriber removed");
        }
        removed
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Debug, PartialEq)]
    struct Payload {
        items: Vec<String>,
        volume: u64,
    }

    fn payload() -> Payload {
        Payload {
            items: vec!["Golden Dominus".into(), "Valkyrie Helm".into()],
            volume: 1_250_000,
        }
    }

    #[test]
    fn test_fan_out_delivers_equal_payload_to_all() {
        let subscribers = Subscribers::<Payload>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        for _ in 0..5 {
            let received = received.clone();
            subscribers.subscribe(move |p: &Payload| received.lock().push(p.clone()));
        }

        let delivered = subscribers.notify(&payload());

        assert_eq!(delivered, 5);
        let received = received.lock();
        assert_eq!(received.len(), 5);
        assert!(received.iter().all(|p| *p == payload()));
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let subscribers = Subscribers::<Payload>::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let subscription = subscribers.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let other = subscribers.subscribe(|_| {});

        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        assert_eq!(subscribers.len(), 1);

        subscribers.notify(&payload());
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_ne!(subscription.id(), other.id());
    }

    #[test]
    fn test_self_removal_during_notify() {
        let subscribers = Subscribers::<Payload>::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));

        let slot_in_callback = slot.clone();
        let counter = hits.clone();
        let subscription = subscribers.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(own) = slot_in_callback.lock().take() {
                own.unsubscribe();
            }
        });
        *slot.lock() = Some(subscription);

        assert_eq!(subscribers.notify(&payload()), 1);
        assert_eq!(subscribers.notify(&payload()), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscribe_during_notify_applies_next_pass() {
        let subscribers = Subscribers::<Payload>::new();
        let registry = subscribers.clone();
        let added = Arc::new(AtomicUsize::new(0));

        let flag = added.clone();
        subscribers.subscribe(move |_| {
            if flag.fetch_add(1, Ordering::SeqCst) == 0 {
                registry.subscribe(|_| {});
            }
        });

        assert_eq!(subscribers.notify(&payload()), 1);
        assert_eq!(subscribers.notify(&payload()), 2);
    }

    #[test]
    fn test_unsubscribe_after_registry_dropped() {
        let subscribers = Subscribers::<Payload>::new();
        let subscription = subscribers.subscribe(|_| {});
        drop(subscribers);

        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_notify_with_no_subscribers() {
        let subscribers = Subscribers::<Payload>::default();
        assert!(subscribers.is_empty());
        assert_eq!(subscribers.notify(&payload()), 0);
    }

    #[test]
    fn test_concurrent_subscribe() {
        let subscribers = Subscribers::<Payload>::new();

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let subscribers = subscribers.clone();
                scope.spawn(move || {
                    for _ in 0..25 {
                        subscribers.subscribe(|_| {});
                    }
                });
            }
        });

        assert_eq!(subscribers.len(), 200);
    }
}
