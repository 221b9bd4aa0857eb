//! Runtime - the root context tying the pieces together.
//!
//! One `Runtime` owns one scheduler, one document, and one set of shared UI
//! signals. Two runtimes never share flush state, so independent component
//! trees (or test harnesses) stay isolated.
//!
//! # Example
//!
//! ```
//! use pulse_ui::component::{Component, Scope};
//! use pulse_ui::runtime::Runtime;
//! use pulse_ui::template::{html, Fragment};
//!
//! struct Hello;
//! impl Component for Hello {
//!     fn render(&mut self, _scope: &Scope) -> Fragment {
//!         html(&["<p>hello</p>"], &[])
//!     }
//! }
//!
//! let runtime = Runtime::new();
//! let root = runtime.document().root();
//! let mut host = runtime.mount("hello-panel", Box::new(Hello), root);
//! // ... event loop: dispatch events, then runtime.flush() each tick ...
//! host.unmount();
//! ```

use std::rc::Rc;

use crate::component::{Component, Host};
use crate::dom::{Document, NodeId};
use crate::signals::{Scheduler, Signal};
use crate::state::UiState;

/// Root context: scheduler + document + shared UI signals.
pub struct Runtime {
    scheduler: Rc<Scheduler>,
    document: Document,
    ui: UiState,
}

impl Runtime {
    pub fn new() -> Self {
        let scheduler = Scheduler::new();
        let ui = UiState::new(&scheduler);
        Self { scheduler, document: Document::new(), ui }
    }

    pub fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Shared UI signals (loading flag, current screen, ...).
    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Create a signal on this runtime's scheduler.
    pub fn signal<T: Clone + PartialEq + 'static>(&self, value: T) -> Signal<T> {
        self.scheduler.signal(value)
    }

    /// Run `f` as a batch; effects collected inside flush on the next
    /// [`Runtime::flush`].
    pub fn batch(&self, f: impl FnOnce()) {
        self.scheduler.run(f);
    }

    /// Drain the deferred continuation queue. The host event loop calls
    /// this after its synchronous work, before timer-based work.
    pub fn flush(&self) -> usize {
        self.scheduler.drain()
    }

    /// Create a host element for `component` and mount it under `parent`.
    pub fn mount(&self, tag: &str, component: Box<dyn Component>, parent: NodeId) -> Host {
        let node = self.document.create_element(tag);
        let mut host = Host::new(component, &self.document, &self.scheduler, node);
        host.mount(parent);
        host
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_runtimes_flush_independently() {
        let a = Runtime::new();
        let b = Runtime::new();

        let s = a.signal(0);
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let unsub = s.on_change(move |_v| h.set(h.get() + 1));

        let s2 = s.clone();
        a.batch(move || s2.set(1));
        assert_eq!(hits.get(), 1); // eager call only

        // Draining the wrong runtime does nothing.
        assert_eq!(b.flush(), 0);
        assert_eq!(hits.get(), 1);

        a.flush();
        assert_eq!(hits.get(), 2);
        unsub();
    }

    #[test]
    fn test_ui_signals_batch_through_runtime() {
        let runtime = Runtime::new();
        let seen = Rc::new(Cell::new(false));

        let s = seen.clone();
        let unsub = runtime.ui().loading.on_change(move |v| s.set(*v));

        let loading = runtime.ui().loading.clone();
        runtime.batch(move || loading.set(true));
        assert!(!seen.get());
        runtime.flush();
        assert!(seen.get());
        unsub();
    }
}
