use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::error::LibraryError;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// One-line message for the footer: the whole context chain, outermost first.
pub(crate) fn surface_error(err: &Error) -> String {
    format!("{err:#}")
}

/// Whether an error should end the session rather than be shown and
/// dismissed.
pub(crate) fn is_fatal(err: &Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<LibraryError>())
        .any(LibraryError::is_fatal)
}
