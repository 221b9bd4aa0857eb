//! Events - dispatched against document nodes.
//!
//! Handlers are `Rc<dyn Fn(&Event)>` so the same handler can be attached in
//! several places and cloned into cleanup closures without ownership issues.

use std::rc::Rc;

use super::document::NodeId;

/// An event delivered to listeners on its target, then on each ancestor.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    /// Event name as bound ("click", "input", ...).
    pub name: String,
    /// Node the event was dispatched against.
    pub target: NodeId,
    /// Optional payload (an input's text, a selected file name, ...).
    pub detail: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self { name: name.into(), target, detail: None }
    }

    pub fn with_detail(name: impl Into<String>, target: NodeId, detail: impl Into<String>) -> Self {
        Self { name: name.into(), target, detail: Some(detail.into()) }
    }
}

/// Event callback type.
pub type EventHandler = Rc<dyn Fn(&Event)>;

/// Key for removing a previously added listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) usize);
