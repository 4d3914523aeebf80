//! Ordered, identity-keyed observer registry.
//!
//! Observers are `Arc`s; removal matches by pointer identity. Registering
//! the same `Arc` twice keeps both entries, so it fires twice until it is
//! removed, and a single removal drops every matching entry.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Callback fired with each incoming payload.
pub type MessageCallback<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// Callback fired on open/close transitions.
pub type EventCallback = Arc<dyn Fn() + Send + Sync>;

/// Ordered collection of observers of type `F` (usually a `dyn Fn`).
pub struct ObserverRegistry<F: ?Sized> {
    observers: Mutex<Vec<Arc<F>>>,
}

impl<F: ?Sized> ObserverRegistry<F> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Appends an observer. Duplicates are kept.
    pub fn add(&self, observer: Arc<F>) {
        self.observers.lock().push(observer);
    }

    /// Removes every entry that is the same `Arc` as `observer`.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&self, observer: &Arc<F>) -> usize {
        let mut observers = self.observers.lock();
        let before = observers.len();
        observers.retain(|existing| !Arc::ptr_eq(existing, observer));
        before - observers.len()
    }

    /// Calls `call` on every observer in registration order.
    ///
    /// The list is snapshotted first and the lock released, so observers
    /// may add or remove observers (including themselves) while being
    /// notified. Such changes apply from the next notification on.
    pub fn for_each(&self, call: impl FnMut(&F)) {
        self.for_each_while(|| true, call);
    }

    /// Like [`for_each`](Self::for_each), but asks `proceed` before every
    /// observer and stops at the first `false`. An observer that tears
    /// down the source silences the ones after it.
    pub fn for_each_while(&self, mut proceed: impl FnMut() -> bool, mut call: impl FnMut(&F)) {
        let snapshot: Vec<Arc<F>> = self.observers.lock().clone();
        for observer in &snapshot {
            if !proceed() {
                break;
            }
            call(observer);
        }
    }

    /// Number of registered entries, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.lock().len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.lock().is_empty()
    }
}

impl<F: ?Sized> Default for ObserverRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ?Sized> fmt::Debug for ObserverRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter() -> (Arc<AtomicUsize>, EventCallback) {
        let count = Arc::new(AtomicUsize::new(0));
        let hits = Arc::clone(&count);
        let callback: EventCallback = Arc::new(move || {
            hits.fetch_add(1, Ordering::SeqCst);
        });
        (count, callback)
    }

    #[test]
    fn fires_in_registration_order() {
        let registry: ObserverRegistry<dyn Fn(&u32, &mut Vec<u32>) + Send + Sync> =
            ObserverRegistry::new();
        registry.add(Arc::new(|v: &u32, out: &mut Vec<u32>| out.push(*v)));
        registry.add(Arc::new(|v: &u32, out: &mut Vec<u32>| out.push(*v * 10)));

        let mut out = Vec::new();
        registry.for_each(|observer| observer(&3, &mut out));
        assert_eq!(out, vec![3, 30]);
    }

    #[test]
    fn duplicate_registration_fires_twice() {
        let registry: ObserverRegistry<dyn Fn() + Send + Sync> = ObserverRegistry::new();
        let (count, callback) = counter();
        registry.add(Arc::clone(&callback));
        registry.add(Arc::clone(&callback));

        registry.for_each(|observer| observer());
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn remove_drops_every_matching_entry() {
        let registry: ObserverRegistry<dyn Fn() + Send + Sync> = ObserverRegistry::new();
        let (count, callback) = counter();
        let (other_count, other) = counter();
        registry.add(Arc::clone(&callback));
        registry.add(Arc::clone(&other));
        registry.add(Arc::clone(&callback));

        assert_eq!(registry.remove(&callback), 2);
        assert_eq!(registry.len(), 1);

        registry.for_each(|observer| observer());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(other_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn identical_closures_are_distinct_identities() {
        let registry: ObserverRegistry<dyn Fn() + Send + Sync> = ObserverRegistry::new();
        let (_, first) = counter();
        let (_, second) = counter();
        registry.add(first);
        assert_eq!(registry.remove(&second), 0);
        assert!(!registry.is_empty());
    }

    #[test]
    fn for_each_while_stops_at_first_refusal() {
        let registry: ObserverRegistry<dyn Fn() + Send + Sync> = ObserverRegistry::new();
        let open = Arc::new(std::sync::atomic::AtomicBool::new(true));
        let (count, callback) = counter();
        let gate = Arc::clone(&open);
        registry.add(Arc::new(move || gate.store(false, Ordering::SeqCst)));
        registry.add(callback);

        registry.for_each_while(|| open.load(Ordering::SeqCst), |observer| observer());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn observer_may_remove_itself_during_notify() {
        let registry: Arc<ObserverRegistry<dyn Fn() + Send + Sync>> =
            Arc::new(ObserverRegistry::new());
        let slot: Arc<Mutex<Option<EventCallback>>> = Arc::new(Mutex::new(None));

        let registry_ref = Arc::clone(&registry);
        let slot_ref = Arc::clone(&slot);
        let callback: EventCallback = Arc::new(move || {
            if let Some(me) = slot_ref.lock().as_ref() {
                registry_ref.remove(me);
            }
        });
        *slot.lock() = Some(Arc::clone(&callback));
        registry.add(callback);

        registry.for_each(|observer| observer());
        assert!(registry.is_empty());
    }
}
