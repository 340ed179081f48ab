//! Observer registry for state change notifications.
//!
//! The host screen subscribes a callback and re-reads the observable fields from the
//! state reference it receives. Callbacks run synchronously on the owning thread.

use std::fmt;

/// Handle returned by [`Observers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<S> = Box<dyn FnMut(&S)>;

/// Ordered list of state callbacks.
pub struct Observers<S> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<S>)>,
}

impl<S> Observers<S> {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    /// Add a callback; it runs after all earlier subscribers.
    pub fn subscribe(&mut self, callback: impl FnMut(&S) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, Box::new(callback)));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Invoke every callback in subscription order.
    pub fn notify(&mut self, state: &S) {
        for (_, callback) in &mut self.entries {
            callback(state);
        }
    }

    /// Drop every callback.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no subscribers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S> Default for Observers<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Observers<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("subscribers", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn notify_calls_subscribers_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut observers = Observers::<u32>::new();

        let first = Rc::clone(&log);
        observers.subscribe(move |v| first.borrow_mut().push(("first", *v)));
        let second = Rc::clone(&log);
        observers.subscribe(move |v| second.borrow_mut().push(("second", *v)));

        observers.notify(&7);

        assert_eq!(*log.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribed_callback_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut observers = Observers::<()>::new();

        let counter = Rc::clone(&count);
        let id = observers.subscribe(move |_| *counter.borrow_mut() += 1);

        assert!(observers.unsubscribe(id));
        observers.notify(&());

        assert_eq!(*count.borrow(), 0);
        assert!(!observers.unsubscribe(id), "second unsubscribe is a no-op");
    }

    #[test]
    fn ids_are_not_reused() {
        let mut observers = Observers::<()>::new();
        let a = observers.subscribe(|_| {});
        observers.unsubscribe(a);
        let b = observers.subscribe(|_| {});
        assert_ne!(a, b);
    }
}
