//! Layout utilities for the screen regions.
//!
//! The navigator sizes page viewports with the same arithmetic the renderer
//! uses to split the frame, so both agree on the body height.

use ratatui::layout::{Constraint, Layout, Rect};

/// Breadcrumb/title line.
pub const TITLE_HEIGHT: u16 = 1;
/// Footer: filter line, banner or scroll position.
pub const STATUS_HEIGHT: u16 = 1;
pub const HELP_HEIGHT: u16 = 1;

/// Maximum width of a modal prompt.
pub const MAX_PROMPT_WIDTH: u16 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenAreas {
    pub title: Rect,
    pub body: Rect,
    pub status: Rect,
    /// Absent in compact mode.
    pub help: Option<Rect>,
}

fn help_height(compact: bool) -> u16 {
    if compact {
        0
    } else {
        HELP_HEIGHT
    }
}

/// Splits the frame into title, body, status and help rows.
pub fn split(area: Rect, compact: bool) -> ScreenAreas {
    let [title, body, status, help] = Layout::vertical([
        Constraint::Length(TITLE_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(STATUS_HEIGHT),
        Constraint::Length(help_height(compact)),
    ])
    .areas(area);
    ScreenAreas {
        title,
        body,
        status,
        help: (!compact).then_some(help),
    }
}

/// Size of the body region for a terminal of the given size.
pub fn body_size(width: u16, height: u16, compact: bool) -> (u16, u16) {
    let chrome = TITLE_HEIGHT + STATUS_HEIGHT + help_height(compact);
    (width, height.saturating_sub(chrome))
}

/// A rectangle of the given height centered horizontally near the top third of `area`.
pub fn prompt_area(area: Rect, height: u16) -> Rect {
    let width = area.width.saturating_sub(4).min(MAX_PROMPT_WIDTH);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + area.height.saturating_sub(height) / 3;
    Rect::new(x, y, width, height)
}
