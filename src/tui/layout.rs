use ratatui::layout::Size;

use crate::tui::pane::{Geometry, BORDER_HEIGHT};
use crate::tui::screen::{LOGO, MENU_LINES};

const MAX_SIDEBAR_WIDTH: u16 = 45;
const MESSAGE_LINES: u16 = 4;

/// Geometry of every pane for one terminal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneLayout {
    pub logo: Geometry,
    pub sidebar: Geometry,
    pub menu: Geometry,
    pub messages: Geometry,
    pub content: Geometry,
}

/// The left column (logo, feeds, keys) is half the screen up to a maximum
/// width; the messages strip spans the bottom; the content fills the rest.
/// Every height is capped at a quarter of the screen.
pub fn compute(size: Size) -> PaneLayout {
    let rows = size.height;
    let cols = size.width;

    let sidebar_width = MAX_SIDEBAR_WIDTH.min(cols / 2);
    let logo_height = (LOGO.len() as u16 + 1).min(rows / 4);
    let menu_height = (MENU_LINES + 2 * BORDER_HEIGHT).min(rows / 4);
    let message_height = (MESSAGE_LINES + 2 * BORDER_HEIGHT).min(rows / 4);

    let sidebar_height = rows
        .saturating_sub(logo_height)
        .saturating_sub(menu_height)
        .saturating_sub(message_height);

    PaneLayout {
        logo: geometry(logo_height, sidebar_width, 0, 0),
        sidebar: geometry(sidebar_height, sidebar_width, logo_height, 0),
        menu: geometry(
            menu_height,
            sidebar_width,
            rows.saturating_sub(menu_height + message_height),
            0,
        ),
        messages: Geometry::new(
            message_height as i32,
            cols as i32,
            -(message_height as i32),
            0,
        ),
        content: geometry(
            rows.saturating_sub(message_height),
            cols.saturating_sub(sidebar_width + 1),
            0,
            sidebar_width + 1,
        ),
    }
}

fn geometry(height: u16, width: u16, row: u16, col: u16) -> Geometry {
    Geometry::new(height as i32, width as i32, row as i32, col as i32)
}
