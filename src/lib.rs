//! # pulse-ui
//!
//! Reactive UI runtime: signals, batched effects, component lifecycle.
//!
//! ## Architecture
//!
//! State lives in [`Signal`]s - observable value cells. Mutating a signal
//! notifies its effects through a [`Scheduler`], which either fires them
//! immediately or, inside a batch, collects them for a deferred flush:
//!
//! ```text
//! set() → Scheduler → run now, or pending → flush (deferred continuation)
//! ```
//!
//! Components describe their output as markup templates with `@event`
//! handler markers; a [`Host`](component::Host) drives the lifecycle
//! (render → bind events → `on_load` → `effects`, then reverse cleanup on
//! unmount) against an in-memory [`Document`] tree. Content is replaced
//! wholesale on first render; there is no diffing.
//!
//! ## Modules
//!
//! - [`signals`] - [`Signal`] and the effect [`Scheduler`]
//! - [`dom`] - arena document tree, events, selector queries
//! - [`template`] - escaped-by-default markup templating
//! - [`component`] - the [`Component`](component::Component) trait, host, and
//!   event-binding resolver
//! - [`state`] - shared UI signals owned by the root context
//! - [`runtime`] - the [`Runtime`](runtime::Runtime) root context

pub mod component;
pub mod dom;
pub mod runtime;
pub mod signals;
pub mod state;
pub mod template;
pub mod types;

// Re-export commonly used items
pub use types::{Cleanup, Value};

pub use signals::{Scheduler, Signal};

pub use dom::{Document, Event, EventHandler, ListenerId, NodeFlags, NodeId};

pub use template::{html, parse_fragment, raw, try_html, Fragment, TemplateError, TemplateNode};

pub use component::{attach_events, binding, Binding, Component, Host, Scope, EVENT_MARKER};

pub use state::UiState;

pub use runtime::Runtime;
