use ratatui::buffer::Buffer;
use ratatui::layout::Size;
use ratatui::style::{Modifier, Style};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::KeyMap;
use crate::tui::event::Action;
use crate::tui::layout::{self, PaneLayout};
use crate::tui::pane::Pane;

pub const LOGO: [&str; 5] = [
    r" _____                 _           ",
    r"|_   _|_ ___  __ _  __| |          ",
    r"  | | `_| _ \/ _` |/ _` |  terminal",
    r"  | | ||  __/ (_| | (_| |  feed    ",
    r"  |_|_| \___\\__'_|\__'_|  reader  ",
];

pub const MENU_LINES: u16 = 8;
const MENU_LABEL_WIDTH: usize = 16;

const SIDEBAR_LINES: usize = 100;
const MESSAGE_LINES: usize = 10;

/// The five panes of the reader and the static text in two of them.
pub struct Screen {
    size: Size,
    menu: Vec<(String, String)>,
    pub logo: Pane,
    pub sidebar: Pane,
    pub keys: Pane,
    pub messages: Pane,
    pub content: Pane,
}

impl Screen {
    pub fn new(size: Size, content_lines: usize, keys: &KeyMap) -> Self {
        let layout = layout::compute(size);
        let mut screen = Self {
            size,
            menu: menu_entries(keys),
            logo: Pane::new(layout.logo, size, LOGO.len()).without_border(),
            sidebar: Pane::new(layout.sidebar, size, SIDEBAR_LINES).with_title("FEEDS"),
            keys: Pane::new(layout.menu, size, MENU_LINES as usize).with_title("KEYS"),
            messages: Pane::new(layout.messages, size, MESSAGE_LINES).with_title("MESSAGES"),
            content: Pane::new(layout.content, size, content_lines),
        };
        screen.draw_static();
        screen
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Rebuild every pane for a new terminal size. Only the logo and key
    /// legend are written again; the rest is up to the caller.
    pub fn resize(&mut self, size: Size) {
        let PaneLayout {
            logo,
            sidebar,
            menu,
            messages,
            content,
        } = layout::compute(size);

        for (pane, geometry) in [
            (&mut self.logo, logo),
            (&mut self.sidebar, sidebar),
            (&mut self.keys, menu),
            (&mut self.messages, messages),
            (&mut self.content, content),
        ] {
            pane.resize(
                geometry.height,
                geometry.width,
                Some(geometry.row),
                Some(geometry.col),
                size,
            );
        }

        self.size = size;
        self.draw_static();
    }

    fn draw_static(&mut self) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let logo_width = LOGO.iter().map(|l| l.width()).max().unwrap_or(0);
        let col = self.logo.width().saturating_sub(logo_width) / 2;
        for (row, line) in LOGO.iter().enumerate() {
            let line = fit(line, self.logo.width().saturating_sub(col));
            log_pane_error(
                "logo",
                self.logo.write(&line, Some(row), col, bold).map(|_| ()),
            );
        }

        let width = self.keys.width();
        let value_width = width.saturating_sub(MENU_LABEL_WIDTH);
        for (row, (label, keys)) in self.menu.iter().enumerate() {
            let line = format!(
                "{}{}",
                fit(label, MENU_LABEL_WIDTH.min(width)),
                fit_right(keys, value_width)
            );
            log_pane_error(
                "keys",
                self.keys.write(&line, Some(row), 0, Style::default()).map(|_| ()),
            );
        }
    }

    /// Copy every pane into the frame buffer.
    pub fn blit(&self, buf: &mut Buffer) {
        for (name, pane) in [
            ("logo", &self.logo),
            ("feeds", &self.sidebar),
            ("keys", &self.keys),
            ("messages", &self.messages),
            ("content", &self.content),
        ] {
            log_pane_error(name, pane.refresh(buf));
        }
    }
}

fn log_pane_error(pane: &str, result: Result<(), crate::tui::pane::PaneError>) {
    if let Err(e) = result {
        tracing::trace!(pane, error = %e, "pane not fully drawn");
    }
}

fn menu_entries(keys: &KeyMap) -> Vec<(String, String)> {
    let pair = |a: Action, b: Action| format!("{}/{}", keys.label(a), keys.label(b));
    vec![
        ("Open/Close Item:".into(), keys.label(Action::Open)),
        ("Prev/Next Item:".into(), pair(Action::PrevItem, Action::NextItem)),
        ("Prev/Next Feed:".into(), pair(Action::PrevFeed, Action::NextFeed)),
        ("Scroll Up/Down:".into(), pair(Action::ScrollUp, Action::ScrollDown)),
        ("Toggle Read:".into(), keys.label(Action::ToggleRead)),
        ("Toggle Star:".into(), keys.label(Action::ToggleStar)),
        ("Open in Browser:".into(), keys.label(Action::OpenInBrowser)),
        ("Quit:".into(), keys.label(Action::Quit)),
    ]
}

/// Clip `text` to `width` columns and pad it with spaces to exactly that.
pub fn fit(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.extend(std::iter::repeat_n(' ', width - used));
    out
}

/// Like [`fit`], but right-aligned.
fn fit_right(text: &str, width: usize) -> String {
    let clipped = fit(text, width);
    let trimmed = clipped.trim_end();
    let pad = width - trimmed.width();
    format!("{}{}", " ".repeat(pad), trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("abc", 5), "abc  ");
        assert_eq!(fit("abcdef", 4), "abcd");
        assert_eq!(fit("漢字", 3), "漢 ");
        assert_eq!(fit("", 0), "");
        assert_eq!(fit_right("J/K", 6), "   J/K");
        assert_eq!(fit_right("SPACE", 3), "SPA");
    }

    #[test]
    fn test_key_legend() {
        let screen = Screen::new(Size::new(80, 24), 100, &KeyMap::default());
        assert_eq!(screen.keys.width(), 36);

        let open = screen.keys.line_text(0).unwrap();
        assert!(open.starts_with("Open/Close Item:"));
        assert!(open.ends_with("SPACE"));
        assert_eq!(open.width(), 36);

        assert!(screen.keys.line_text(1).unwrap().ends_with("K/J"));
        assert!(screen.keys.line_text(3).unwrap().ends_with("UP/DOWN"));
        assert!(screen.keys.line_text(7).unwrap().ends_with("Q"));
    }

    #[test]
    fn test_logo_is_centred() {
        let screen = Screen::new(Size::new(100, 40), 100, &KeyMap::default());
        // 45 columns wide, 35 column logo
        let first = screen.logo.line_text(0).unwrap();
        assert_eq!(first.trim_end(), format!("     {}", LOGO[0].trim_end()));
    }

    #[test]
    fn test_blit_draws_every_pane() {
        let size = Size::new(80, 24);
        let screen = Screen::new(size, 100, &KeyMap::default());
        let mut buf = Buffer::empty(Rect::new(0, 0, size.width, size.height));

        screen.blit(&mut buf);

        assert!(row_text(&buf, 6).contains("FEEDS"));
        assert!(row_text(&buf, 12).contains("KEYS"));
        assert!(row_text(&buf, 18).contains("MESSAGES"));
        assert!(row_text(&buf, 0).contains("_____"));
    }

    #[test]
    fn test_resize_rebuilds_panes() {
        let mut screen = Screen::new(Size::new(80, 24), 100, &KeyMap::default());
        screen.content.write("stale", None, 0, Style::default()).unwrap();

        screen.resize(Size::new(40, 12));

        assert_eq!(screen.size(), Size::new(40, 12));
        assert_eq!(screen.content.content_len(), 0);
        assert_eq!(screen.content.area(), Rect::new(21, 0, 19, 9));
        assert!(screen.keys.content_len() > 0);

        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 12));
        screen.blit(&mut buf);
    }
}
