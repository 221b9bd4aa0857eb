//! Shared state owned by the root context.

pub mod ui;

pub use ui::UiState;
