//! Ratatui front-end: a nested menu over the library operations, input forms
//! and confirmation dialogs drawn as popups, and scrollable report screens.

mod app;
mod forms;
mod helpers;
mod menu;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
