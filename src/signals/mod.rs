//! Reactive core - observable values and the effect scheduler.
//!
//! - [`Signal`] - observable value cell with subscribed change effects
//! - [`Scheduler`] - decides whether an effect fires now or in a deferred flush

pub mod scheduler;
pub mod signal;

pub use scheduler::{ScheduledEffect, Scheduler};
pub use signal::{Signal, SignalEffect};
