//! Signal - observable value cell.
//!
//! A `Signal<T>` holds a current value and an insertion-ordered list of
//! subscribed effects. Assigning an equal value (by `PartialEq`) is a no-op;
//! assigning a different value records the previous one and hands the
//! scheduler one continuation per subscriber carrying the new value.
//!
//! Signals are cheap-clone handles: clones share the same cell, so a signal
//! can be captured by event handlers and effect closures freely.
//!
//! # Example
//!
//! ```
//! use pulse_ui::signals::Scheduler;
//!
//! let sched = Scheduler::new();
//! let name = sched.signal(String::from("alex"));
//!
//! let unsubscribe = name.on_change(|v| println!("name is now {v}"));
//! name.set(String::from("morgan"));
//! unsubscribe();
//! ```

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::scheduler::Scheduler;

/// Effect callback subscribed to a signal's changes.
pub type SignalEffect<T> = Rc<dyn Fn(&T)>;

struct SignalInner<T> {
    value: RefCell<T>,
    /// Value before the last effective `set`.
    previous: RefCell<Option<T>>,
    /// Subscribers in insertion order. The id is the removal key.
    subscribers: RefCell<Vec<(usize, SignalEffect<T>)>>,
    next_id: Cell<usize>,
    scheduler: Rc<Scheduler>,
}

// =============================================================================
// Signal
// =============================================================================

/// Observable value cell dispatching change effects through a [`Scheduler`].
pub struct Signal<T: Clone + PartialEq + 'static> {
    inner: Rc<SignalInner<T>>,
}

impl<T: Clone + PartialEq + 'static> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<T: Clone + PartialEq + 'static> Signal<T> {
    pub(crate) fn new(value: T, scheduler: Rc<Scheduler>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                value: RefCell::new(value),
                previous: RefCell::new(None),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                scheduler,
            }),
        }
    }

    /// Current value. No side effects.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Value before the last effective `set`, if any set has happened.
    pub fn previous(&self) -> Option<T> {
        self.inner.previous.borrow().clone()
    }

    /// Assign a new value.
    ///
    /// Equal values (by `PartialEq`) are a no-op: no effect is scheduled and
    /// the previous value is untouched. Otherwise the old value is recorded
    /// and every subscriber is scheduled once with the new value - one fresh
    /// continuation per subscriber per mutation, so repeated mutations inside
    /// a batch flush once each, never coalesced.
    pub fn set(&self, value: T) {
        if *self.inner.value.borrow() == value {
            return;
        }
        let old = self.inner.value.replace(value.clone());
        *self.inner.previous.borrow_mut() = Some(old);

        // Snapshot subscribers so effects can subscribe/unsubscribe while
        // running without holding the borrow.
        let subscribers: Vec<SignalEffect<T>> = self
            .inner
            .subscribers
            .borrow()
            .iter()
            .map(|(_, effect)| Rc::clone(effect))
            .collect();

        for effect in subscribers {
            let v = value.clone();
            self.inner
                .scheduler
                .schedule_effect(Box::new(move || effect(&v)));
        }
    }

    /// Apply `f` to the current value and assign the result.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = f(&self.inner.value.borrow().clone());
        self.set(next);
    }

    /// Subscribe `effect` to changes.
    ///
    /// The effect is invoked once, synchronously and eagerly, with the value
    /// at subscription time - regardless of batching state. It is then
    /// appended to the subscriber list. The returned closure removes exactly
    /// this subscription; calling it after the signal is gone is harmless.
    #[must_use = "dropping the closure leaks the subscription; register it as a cleanup"]
    pub fn on_change<F: Fn(&T) + 'static>(&self, effect: F) -> impl FnOnce() + 'static + use<T, F> {
        let effect: SignalEffect<T> = Rc::new(effect);

        // Eager initial call. Clone out first: the effect may set() this
        // same signal, which needs the value borrow released.
        let current = self.get();
        effect(&current);

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        self.inner.subscribers.borrow_mut().push((id, effect));

        let weak: Weak<SignalInner<T>> = Rc::downgrade(&self.inner);
        move || {
            if let Some(inner) = weak.upgrade() {
                inner.subscribers.borrow_mut().retain(|(i, _)| *i != id);
            }
        }
    }

    /// Remove every subscriber.
    pub fn clear_subscribers(&self) {
        self.inner.subscribers.borrow_mut().clear();
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// The scheduler this signal dispatches through.
    pub fn scheduler(&self) -> Rc<Scheduler> {
        Rc::clone(&self.inner.scheduler)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorded<T: Clone + PartialEq + 'static>(
        signal: &Signal<T>,
    ) -> (Rc<RefCell<Vec<T>>>, impl FnOnce() + use<T>) {
        let calls = Rc::new(RefCell::new(Vec::new()));
        let c = calls.clone();
        let unsubscribe = signal.on_change(move |v: &T| c.borrow_mut().push(v.clone()));
        (calls, unsubscribe)
    }

    #[test]
    fn test_get_set() {
        let sched = Scheduler::new();
        let s = sched.signal(1);
        assert_eq!(s.get(), 1);
        s.set(2);
        assert_eq!(s.get(), 2);
        assert_eq!(s.previous(), Some(1));
    }

    #[test]
    fn test_equal_set_is_noop() {
        let sched = Scheduler::new();
        let s = sched.signal(5);
        let (calls, _unsub) = recorded(&s);

        s.set(5);
        assert_eq!(*calls.borrow(), vec![5]); // only the eager initial call
        assert_eq!(s.previous(), None);
    }

    #[test]
    fn test_on_change_eager_initial_call() {
        let sched = Scheduler::new();
        let s = sched.signal(7);

        // Eager even inside a batch.
        let calls = Rc::new(RefCell::new(Vec::new()));
        let inner = sched.clone();
        let s2 = s.clone();
        let c = calls.clone();
        sched.run(move || {
            let c2 = c.clone();
            let unsub = s2.on_change(move |v| c2.borrow_mut().push(*v));
            assert_eq!(*c.borrow(), vec![7]);
            assert!(inner.is_batching());
            std::mem::forget(unsub);
        });
    }

    #[test]
    fn test_synchronous_notification_outside_batch() {
        let sched = Scheduler::new();
        let s = sched.signal(0);
        let (calls, _unsub) = recorded(&s);

        s.set(5);
        assert_eq!(*calls.borrow(), vec![0, 5]); // fired in our stack, no drain
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let sched = Scheduler::new();
        let s = sched.signal(0);
        let (calls, unsub) = recorded(&s);

        s.set(1);
        unsub();
        s.set(2);

        assert_eq!(*calls.borrow(), vec![0, 1]);
        assert_eq!(s.subscriber_count(), 0);
    }

    #[test]
    fn test_clear_subscribers() {
        let sched = Scheduler::new();
        let s = sched.signal(0);
        let (calls, _unsub) = recorded(&s);
        let (_calls2, _unsub2) = recorded(&s);
        assert_eq!(s.subscriber_count(), 2);

        s.clear_subscribers();
        s.set(9);

        assert_eq!(s.subscriber_count(), 0);
        assert_eq!(*calls.borrow(), vec![0]);
    }

    #[test]
    fn test_two_mutations_in_batch_flush_once_each() {
        let sched = Scheduler::new();
        let s = sched.signal(0);
        let (calls, _unsub) = recorded(&s);

        s.set(5);
        let s2 = s.clone();
        sched.run(move || {
            s2.set(6);
            s2.set(7);
        });

        // Still unflushed after run() returns.
        assert_eq!(*calls.borrow(), vec![0, 5]);

        sched.drain();
        // One invocation per mutation, each with its own value.
        assert_eq!(*calls.borrow(), vec![0, 5, 6, 7]);
    }

    #[test]
    fn test_interleave_across_signals_in_setter_order() {
        let sched = Scheduler::new();
        let a = sched.signal(0);
        let b = sched.signal(0);
        let order = Rc::new(RefCell::new(Vec::new()));

        let o = order.clone();
        std::mem::forget(a.on_change(move |v| o.borrow_mut().push(format!("a{v}"))));
        let o = order.clone();
        std::mem::forget(b.on_change(move |v| o.borrow_mut().push(format!("b{v}"))));
        order.borrow_mut().clear();

        let (a2, b2) = (a.clone(), b.clone());
        sched.run(move || {
            b2.set(1);
            a2.set(1);
            b2.set(2);
        });
        sched.drain();

        assert_eq!(*order.borrow(), vec!["b1", "a1", "b2"]);
    }

    #[test]
    fn test_update() {
        let sched = Scheduler::new();
        let s = sched.signal(10);
        s.update(|v| v * 2);
        assert_eq!(s.get(), 20);
    }

    #[test]
    fn test_clone_shares_cell() {
        let sched = Scheduler::new();
        let s = sched.signal(String::from("x"));
        let t = s.clone();
        t.set(String::from("y"));
        assert_eq!(s.get(), "y");
    }

    #[test]
    fn test_unsubscribe_after_signal_dropped_is_harmless() {
        let sched = Scheduler::new();
        let s = sched.signal(0);
        let (_calls, unsub) = recorded(&s);
        drop(s);
        unsub();
    }
}
