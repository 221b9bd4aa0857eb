//! Event-binding resolver - declarative handler wiring.
//!
//! Templates mark handlers with `@`-prefixed attributes: `@click="toggle"`
//! means "on click, run the binding named `toggle`". After a component
//! renders, [`attach_events`] walks the fresh subtree, resolves each marker
//! against the component's binding table, attaches listeners, and strips the
//! marker attributes so they never show up in queries or serialization.
//!
//! A marker naming a missing binding is non-fatal: it logs a warning and the
//! element is left unbound (the attribute is still stripped).
//!
//! The table is built at render time from real handler references - there is
//! no runtime method-name reflection to go wrong beyond a template typo.

use std::rc::Rc;

use crate::dom::{Document, Event, EventHandler, NodeId};
use crate::types::Cleanup;

/// Attribute prefix marking a declarative event binding.
pub const EVENT_MARKER: char = '@';

// =============================================================================
// Binding
// =============================================================================

/// One named handler a component exposes to its template.
#[derive(Clone)]
pub struct Binding {
    /// Name templates refer to (`@click="toggle"` refers to `toggle`).
    pub name: String,
    pub handler: EventHandler,
}

/// Build a binding from a closure.
pub fn binding(name: impl Into<String>, handler: impl Fn(&Event) + 'static) -> Binding {
    Binding { name: name.into(), handler: Rc::new(handler) }
}

// =============================================================================
// Resolver
// =============================================================================

/// Wire every marker attribute under `root` to its named binding.
///
/// Returns one un-bind closure per attached listener; the caller folds these
/// into its cleanup list so listeners are removed on unmount.
pub fn attach_events(document: &Document, root: NodeId, bindings: &[Binding]) -> Vec<Cleanup> {
    let mut cleanups: Vec<Cleanup> = Vec::new();

    for node in document.descendants(root) {
        if !document.is_element(node) {
            continue;
        }
        // Snapshot: we mutate the attribute list while iterating.
        let marked: Vec<(String, String)> = document
            .attributes(node)
            .into_iter()
            .filter(|(name, _)| name.starts_with(EVENT_MARKER))
            .collect();

        for (attribute, handler_name) in marked {
            // Strip the marker first so it never leaks into serialization,
            // bound or not.
            document.remove_attribute(node, &attribute);
            let event_name = &attribute[EVENT_MARKER.len_utf8()..];

            match bindings.iter().find(|b| b.name == handler_name) {
                Some(binding) => {
                    let listener =
                        document.add_listener(node, event_name, Rc::clone(&binding.handler));
                    let doc = document.clone();
                    cleanups.push(Box::new(move || doc.remove_listener(node, listener)));
                }
                None => {
                    tracing::warn!(
                        handler = %handler_name,
                        event = %event_name,
                        "no binding registered for handler"
                    );
                }
            }
        }
    }

    cleanups
}

// =============================================================================
// Tests
// =============================================================================
