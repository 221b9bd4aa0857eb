//! Document tree - the substrate components mount into.
//!
//! - [`Document`] - arena of element/text nodes with attributes and listeners
//! - [`Event`] - dispatched against a node, bubbling through ancestors
//! - Simple selector queries (`tag`, `#id`, `.class`, compounds)
//!
//! No styling, no layout, no diffing: a component's content is replaced
//! wholesale when it first renders.

pub mod document;
pub mod event;
mod selector;

pub use document::{Document, NodeFlags, NodeId};
pub use event::{Event, EventHandler, ListenerId};
