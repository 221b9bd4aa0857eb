//! Shared UI signals - cross-cutting state any component may use.
//!
//! One `UiState` per root context (not module globals): independent
//! runtimes, and test harnesses, each get their own.

use std::rc::Rc;

use crate::signals::{Scheduler, Signal};

/// Cross-cutting UI signals.
///
/// Cheap to clone; clones share the underlying cells.
#[derive(Clone)]
pub struct UiState {
    /// Which editor screen is showing.
    pub screen: Signal<String>,
    /// Currently opened project file, if any.
    pub project: Signal<Option<String>>,
    /// Global busy overlay flag.
    pub loading: Signal<bool>,
    /// Which panel is currently being edited, if any.
    pub editing: Signal<Option<String>>,
}

impl UiState {
    pub fn new(scheduler: &Rc<Scheduler>) -> Self {
        Self {
            screen: scheduler.signal("character".to_string()),
            project: scheduler.signal(None),
            loading: scheduler.signal(false),
            editing: scheduler.signal(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let scheduler = Scheduler::new();
        let ui = UiState::new(&scheduler);
        assert_eq!(ui.screen.get(), "character");
        assert_eq!(ui.project.get(), None);
        assert!(!ui.loading.get());
        assert_eq!(ui.editing.get(), None);
    }

    #[test]
    fn test_clones_share_cells() {
        let scheduler = Scheduler::new();
        let ui = UiState::new(&scheduler);
        let other = ui.clone();
        other.loading.set(true);
        assert!(ui.loading.get());
    }
}
