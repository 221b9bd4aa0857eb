//! Effect Scheduler - batched, deferred effect execution.
//!
//! The scheduler decides whether a signal effect fires immediately or is
//! collected and flushed later as a group:
//!
//! - Outside a batch, effects run synchronously in the mutator's call stack.
//! - Inside [`Scheduler::run`], effects are collected into a pending list and
//!   replayed by a flush continuation pushed onto the deferred queue.
//!
//! The deferred queue is the host's cooperative "microtask" boundary: the
//! host event loop calls [`Scheduler::drain`] after its current synchronous
//! work and before any timer-based work.
//!
//! Each scheduler is an explicitly constructed `Rc` handle. Signals created
//! from one scheduler never share flush state with another, so independent
//! component trees (or test harnesses) can each own their own.
//!
//! # Example
//!
//! ```
//! use pulse_ui::signals::Scheduler;
//!
//! let sched = Scheduler::new();
//! let count = sched.signal(0);
//!
//! sched.run(|| {
//!     count.set(1);
//!     count.set(2);
//! });
//! // Nothing has fired yet; effects run on drain.
//! sched.drain();
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use super::signal::Signal;

/// A scheduled unit of work: one effect invocation carrying its value.
pub type ScheduledEffect = Box<dyn FnOnce()>;

// =============================================================================
// Scheduler
// =============================================================================

/// Batches signal effects and owns the deferred continuation queue.
pub struct Scheduler {
    /// Whether a batch is currently executing. Shared by nested `run` calls:
    /// the flag is a single cell, not a stack, so an inner `run` clears it
    /// for the outer one when it completes.
    batching: Cell<bool>,
    /// Effects collected during a batch, in scheduling order.
    pending: RefCell<Vec<ScheduledEffect>>,
    /// Deferred continuations, drained FIFO by the host.
    deferred: RefCell<VecDeque<ScheduledEffect>>,
}

impl Scheduler {
    /// Create a new scheduler handle.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            batching: Cell::new(false),
            pending: RefCell::new(Vec::new()),
            deferred: RefCell::new(VecDeque::new()),
        })
    }

    /// Create a signal whose effects are dispatched through this scheduler.
    pub fn signal<T: Clone + PartialEq + 'static>(self: &Rc<Self>, value: T) -> Signal<T> {
        Signal::new(value, Rc::clone(self))
    }

    /// Execute `f` as a batch.
    ///
    /// Signal mutations inside `f` collect their effects instead of firing
    /// them; a flush continuation is then pushed onto the deferred queue. The
    /// flush replays every pending effect once, in scheduling order, and
    /// leaves the pending list empty.
    ///
    /// Each mutation schedules a fresh continuation, so two mutations of the
    /// same signal inside one batch flush as two invocations (one per
    /// mutation, each with the value it was scheduled with) - they are never
    /// coalesced into a single call with the final value.
    ///
    /// `run` is not reentrant-safe: a nested `run` shares this scheduler's
    /// flag and pending list, and clears the flag when the inner closure
    /// completes. Mutations performed by the outer closure after that point
    /// fire immediately.
    pub fn run(self: &Rc<Self>, f: impl FnOnce()) {
        self.batching.set(true);
        f();
        self.batching.set(false);

        let sched = Rc::clone(self);
        self.defer(Box::new(move || sched.flush_pending()));
    }

    /// Hand the scheduler one effect invocation.
    ///
    /// Batching: appended to the pending list. Otherwise: invoked here,
    /// synchronously, in the caller's stack.
    pub fn schedule_effect(&self, effect: ScheduledEffect) {
        if self.batching.get() {
            self.pending.borrow_mut().push(effect);
        } else {
            effect();
        }
    }

    /// Whether a batch is currently executing.
    pub fn is_batching(&self) -> bool {
        self.batching.get()
    }

    /// Push a continuation onto the deferred queue.
    pub fn defer(&self, task: ScheduledEffect) {
        self.deferred.borrow_mut().push_back(task);
    }

    /// Run deferred continuations FIFO until the queue is empty.
    ///
    /// Continuations may defer further work; it runs in the same drain.
    /// Returns the number of continuations executed.
    pub fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            // Pop before running so a continuation can defer more work
            // without holding the borrow.
            let task = self.deferred.borrow_mut().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    /// Number of effects currently pending flush.
    pub fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Number of continuations sitting in the deferred queue.
    pub fn deferred_count(&self) -> usize {
        self.deferred.borrow().len()
    }

    /// Replay every pending effect once, in scheduling order.
    fn flush_pending(&self) {
        // Drain first: effects may mutate signals, which re-enters
        // schedule_effect (immediately, since batching is off by now).
        let effects: Vec<ScheduledEffect> = self.pending.borrow_mut().drain(..).collect();
        for effect in effects {
            effect();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
