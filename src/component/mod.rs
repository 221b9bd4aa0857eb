//! Component lifecycle - render, bind, mount hooks, guaranteed teardown.
//!
//! A component is a plain struct implementing [`Component`]; the runtime
//! wraps it in a [`Host`] that owns its element node, its [`Scope`] (named
//! signals + cleanup list), and the mount state. Composition, not
//! inheritance: the reactive machinery is not coupled to any element type.
//!
//! Lifecycle on first mount:
//!
//! 1. `render()` - produce the fragment (required; the trait makes a missing
//!    implementation a compile error rather than a runtime throw)
//! 2. content replaced wholesale with the fragment
//! 3. `bindings()` built and the event-binding resolver wires markers,
//!    folding un-bind closures into the cleanup list
//! 4. `on_load()` - the subtree is queryable now
//! 5. `effects()` - subscribe to signals; register each unsubscribe
//!
//! On unmount: host element detaches, every registered cleanup runs once in
//! registration order, the list is cleared, then `on_unload()`.
//!
//! The render guard is once-ever for the host's lifetime: re-mounting a
//! previously unmounted host re-attaches the element but does not render,
//! bind, or subscribe again.
//!
//! # Example
//!
//! ```
//! use pulse_ui::component::{binding, Binding, Component, Scope};
//! use pulse_ui::template::{html, Fragment};
//! use pulse_ui::types::Value;
//!
//! struct Counter;
//!
//! impl Component for Counter {
//!     fn render(&mut self, scope: &Scope) -> Fragment {
//!         scope.set_signal([("count", Value::Int(0))]);
//!         html(&[r#"<button @click="bump">+1</button><span class="count">0</span>"#], &[])
//!     }
//!
//!     fn bindings(&self, scope: &Scope) -> Vec<Binding> {
//!         let count = scope.signal("count").unwrap();
//!         vec![binding("bump", move |_event| {
//!             count.update(|v| Value::Int(v.as_int().unwrap_or(0) + 1));
//!         })]
//!     }
//!
//!     fn effects(&mut self, scope: &Scope) {
//!         let count = scope.signal("count").unwrap();
//!         let (doc, node) = (scope.document(), scope.node());
//!         scope.register(count.on_change(move |v| {
//!             if let Some(label) = doc.query(node, ".count") {
//!                 doc.set_text_content(label, v.to_string());
//!             }
//!         }));
//!     }
//! }
//! ```

pub mod bindings;

pub use bindings::{attach_events, binding, Binding, EVENT_MARKER};

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::dom::{Document, NodeId};
use crate::signals::{Scheduler, Signal};
use crate::template::Fragment;
use crate::types::{Cleanup, Value};

// =============================================================================
// Component trait
// =============================================================================

/// Override points for a lifecycle-managed UI unit.
///
/// Only `render` is required. The default `bindings` table is empty and the
/// remaining hooks are no-ops.
pub trait Component {
    /// Produce the component's content. Runs once per host lifetime.
    fn render(&mut self, scope: &Scope) -> Fragment;

    /// Named handler table for the template's `@event="name"` markers.
    /// Built right after `render`, before `on_load`.
    fn bindings(&self, _scope: &Scope) -> Vec<Binding> {
        Vec::new()
    }

    /// Called once after first mount and event binding; the rendered
    /// subtree is attached and queryable.
    fn on_load(&mut self, _scope: &Scope) {}

    /// Called once per unmount, after registered cleanups have run.
    fn on_unload(&mut self, _scope: &Scope) {}

    /// Called once after `on_load`; the place to subscribe to signals.
    /// Register each subscription's unsubscribe closure on the scope.
    fn effects(&mut self, _scope: &Scope) {}
}

// =============================================================================
// Scope
// =============================================================================

struct ScopeInner {
    document: Document,
    scheduler: Rc<Scheduler>,
    node: Cell<NodeId>,
    /// Name -> signal. Keys are stable for the host's lifetime.
    signals: RefCell<HashMap<String, Signal<Value>>>,
    /// Teardown functions, run in registration order on unmount.
    cleanup: RefCell<Vec<Cleanup>>,
}

/// Per-instance handle lifecycle hooks and handlers work through.
///
/// Cheap to clone; clones share the same signal map and cleanup list, so
/// event handlers and effect closures can capture one.
#[derive(Clone)]
pub struct Scope {
    inner: Rc<ScopeInner>,
}

impl Scope {
    fn new(document: Document, scheduler: Rc<Scheduler>, node: NodeId) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                document,
                scheduler,
                node: Cell::new(node),
                signals: RefCell::new(HashMap::new()),
                cleanup: RefCell::new(Vec::new()),
            }),
        }
    }

    /// The document this component lives in.
    pub fn document(&self) -> Document {
        self.inner.document.clone()
    }

    /// The scheduler behind this component's signals.
    pub fn scheduler(&self) -> Rc<Scheduler> {
        Rc::clone(&self.inner.scheduler)
    }

    /// The host element node.
    pub fn node(&self) -> NodeId {
        self.inner.node.get()
    }

    /// Declare or update named signals.
    ///
    /// Unknown keys create a new signal initialized to the given value;
    /// known keys assign through the normal setter, so effects fire only
    /// when the value actually differs.
    pub fn set_signal<K, V, I>(&self, entries: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            let existing = self.inner.signals.borrow().get(&key).cloned();
            match existing {
                Some(signal) => signal.set(value),
                None => {
                    let signal = self.inner.scheduler.signal(value);
                    self.inner.signals.borrow_mut().insert(key, signal);
                }
            }
        }
    }

    /// Look up a named signal. Clones the handle; the map keeps its own.
    pub fn signal(&self, name: &str) -> Option<Signal<Value>> {
        self.inner.signals.borrow().get(name).cloned()
    }

    /// Register a teardown function to run on unmount.
    pub fn register(&self, cleanup: impl FnOnce() + 'static) {
        self.inner.cleanup.borrow_mut().push(Box::new(cleanup));
    }

    /// Number of teardown functions currently registered.
    pub fn cleanup_count(&self) -> usize {
        self.inner.cleanup.borrow().len()
    }

    /// First match for `selector` under the host element.
    pub fn query(&self, selector: &str) -> Option<NodeId> {
        self.inner.document.query(self.node(), selector)
    }

    /// All matches for `selector` under the host element.
    pub fn query_all(&self, selector: &str) -> Vec<NodeId> {
        self.inner.document.query_all(self.node(), selector)
    }

    fn register_boxed(&self, cleanup: Cleanup) {
        self.inner.cleanup.borrow_mut().push(cleanup);
    }

    /// Run every registered cleanup once, in registration order, and clear
    /// the list. Cleanups may register further cleanups; those run in the
    /// same pass.
    fn run_cleanups(&self) {
        loop {
            let batch: Vec<Cleanup> =
                self.inner.cleanup.borrow_mut().drain(..).collect();
            if batch.is_empty() {
                break;
            }
            for cleanup in batch {
                cleanup();
            }
        }
    }
}

// =============================================================================
// Host
// =============================================================================

/// Owns a component instance, its element node, and its mount state.
pub struct Host {
    component: Box<dyn Component>,
    scope: Scope,
    /// Once-ever: survives unmount, so re-mounting never re-renders.
    rendered: bool,
    mounted: bool,
}

impl Host {
    /// Wrap a component. `node` is the host element (usually freshly
    /// created, still detached).
    pub fn new(
        component: Box<dyn Component>,
        document: &Document,
        scheduler: &Rc<Scheduler>,
        node: NodeId,
    ) -> Self {
        Self {
            component,
            scope: Scope::new(document.clone(), Rc::clone(scheduler), node),
            rendered: false,
            mounted: false,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn node(&self) -> NodeId {
        self.scope.node()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// Attach the host element under `parent` and, on first mount, run the
    /// full lifecycle: render, wholesale content replacement, event binding,
    /// `on_load`, `effects`.
    pub fn mount(&mut self, parent: NodeId) {
        if self.mounted {
            return;
        }
        let document = self.scope.document();
        document.append_child(parent, self.scope.node());
        self.mounted = true;

        if !self.rendered {
            self.rendered = true;

            let fragment = self.component.render(&self.scope);
            document.replace_children(self.scope.node(), &fragment);

            let table = self.component.bindings(&self.scope);
            for cleanup in attach_events(&document, self.scope.node(), &table) {
                self.scope.register_boxed(cleanup);
            }

            self.component.on_load(&self.scope);
            self.component.effects(&self.scope);
            tracing::debug!(node = ?self.scope.node(), "component rendered");
        }
    }

    /// Detach the host element, run registered cleanups once in
    /// registration order, clear the list, then `on_unload`.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;

        self.scope.document().detach(self.scope.node());
        self.scope.run_cleanups();
        self.component.on_unload(&self.scope);
        tracing::debug!(node = ?self.scope.node(), "component unmounted");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::html;

    /// Records every lifecycle call in order.
    struct Probe {
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl Component for Probe {
        fn render(&mut self, scope: &Scope) -> Fragment {
            scope.set_signal([("flag", Value::Bool(false))]);
            self.log.borrow_mut().push("render");
            html(&[r#"<div class="body"><button @click="poke">x</button></div>"#], &[])
        }

        fn bindings(&self, _scope: &Scope) -> Vec<Binding> {
            self.log.borrow_mut().push("bindings");
            let log = self.log.clone();
            vec![binding("poke", move |_e| log.borrow_mut().push("poke"))]
        }

        fn on_load(&mut self, scope: &Scope) {
            self.log.borrow_mut().push("on_load");
            // Subtree must be attached and queryable here.
            assert!(scope.query(".body").is_some());
            assert!(scope.document().is_connected(scope.node()));
        }

        fn effects(&mut self, scope: &Scope) {
            self.log.borrow_mut().push("effects");
            let log = self.log.clone();
            let flag = scope.signal("flag").unwrap();
            scope.register(flag.on_change(move |_v| log.borrow_mut().push("flag")));
        }

        fn on_unload(&mut self, _scope: &Scope) {
            self.log.borrow_mut().push("on_unload");
        }
    }

    fn probe_host() -> (Host, Rc<RefCell<Vec<&'static str>>>, Document) {
        let scheduler = Scheduler::new();
        let document = Document::new();
        let node = document.create_element("probe-component");
        let log = Rc::new(RefCell::new(Vec::new()));
        let host = Host::new(
            Box::new(Probe { log: log.clone() }),
            &document,
            &scheduler,
            node,
        );
        (host, log, document)
    }

    #[test]
    fn test_mount_order() {
        let (mut host, log, doc) = probe_host();
        host.mount(doc.root());

        assert_eq!(
            *log.borrow(),
            vec!["render", "bindings", "on_load", "effects", "flag"]
        );
        assert!(host.is_mounted());
        assert!(host.is_rendered());
    }

    #[test]
    fn test_unmount_runs_cleanups_once_and_clears() {
        let (mut host, log, doc) = probe_host();
        host.mount(doc.root());

        // Event binding cleanup + effect unsubscribe.
        assert_eq!(host.scope().cleanup_count(), 2);

        host.unmount();
        assert_eq!(host.scope().cleanup_count(), 0);
        assert_eq!(log.borrow().last(), Some(&"on_unload"));
        assert!(!doc.is_connected(host.node()));

        // Cleanups ran: the signal no longer reaches the effect.
        host.scope().signal("flag").unwrap().set(Value::Bool(true));
        assert!(!log.borrow().contains(&"flag"));

        // Second unmount is a no-op.
        host.unmount();
        assert_eq!(log.borrow().iter().filter(|s| **s == "on_unload").count(), 1);
    }

    #[test]
    fn test_remount_does_not_rerender() {
        let (mut host, log, doc) = probe_host();
        host.mount(doc.root());
        host.unmount();
        log.borrow_mut().clear();

        host.mount(doc.root());
        assert!(host.is_mounted());
        assert!(doc.is_connected(host.node()));
        // No render, bindings, on_load, or effects the second time.
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_bound_handler_fires_until_unmount() {
        let (mut host, log, doc) = probe_host();
        host.mount(doc.root());

        let button = host.scope().query("button").unwrap();
        doc.dispatch(&crate::dom::Event::new("click", button));
        assert_eq!(log.borrow().last(), Some(&"poke"));

        host.unmount();
        log.borrow_mut().clear();
        doc.dispatch(&crate::dom::Event::new("click", button));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_set_signal_update_goes_through_setter() {
        let (mut host, _log, doc) = probe_host();
        host.mount(doc.root());
        let scope = host.scope().clone();

        let flag = scope.signal("flag").unwrap();
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        scope.register(flag.on_change(move |_v| h.set(h.get() + 1)));
        assert_eq!(hits.get(), 1); // eager call

        // Same value: setter no-ops.
        scope.set_signal([("flag", Value::Bool(false))]);
        assert_eq!(hits.get(), 1);

        // Different value: notifies.
        scope.set_signal([("flag", Value::Bool(true))]);
        assert_eq!(hits.get(), 2);

        // Key identity is stable: still the same signal.
        assert!(flag.get().as_bool().unwrap());
    }

    #[test]
    fn test_marker_attributes_stripped_from_rendered_tree() {
        let (mut host, _log, doc) = probe_host();
        host.mount(doc.root());
        assert!(!doc.to_markup(host.node()).contains('@'));
    }
}
