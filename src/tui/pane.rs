//! Scrollable, bordered screen regions backed by an off-screen line buffer.
//!
//! A pane keeps more text than it can show. Writes go to the buffer, which
//! grows on demand; [`Pane::refresh`] copies the visible window of it, plus the
//! border and title, into a ratatui [`Buffer`].

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect, Size};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Widget};
use unicode_width::UnicodeWidthChar;

/// Rows taken by the border at the top and at the bottom.
pub const BORDER_HEIGHT: u16 = 1;
/// Columns taken by the border plus padding on the left and on the right.
pub const BORDER_WIDTH: u16 = 2;

/// Rows added to the buffer capacity whenever a write runs past it.
const GROW_STEP: usize = 10;
const TAB_STOP: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PaneError {
    #[error("pane has no room for text")]
    ZeroWidth,
    #[error("pane is partly off screen")]
    Clipped,
    #[error("pane is off screen")]
    Offscreen,
}

/// Outer rectangle of a pane. Negative values count back from the far edge
/// of the screen, so `row: -6` is six rows above the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub height: i32,
    pub width: i32,
    pub row: i32,
    pub col: i32,
}

impl Geometry {
    pub fn new(height: i32, width: i32, row: i32, col: i32) -> Self {
        Self {
            height,
            width,
            row,
            col,
        }
    }

    pub fn resolve(&self, screen: Size) -> Rect {
        Rect {
            x: relative(self.col, screen.width),
            y: relative(self.row, screen.height),
            width: relative(self.width, screen.width),
            height: relative(self.height, screen.height),
        }
    }
}

fn relative(value: i32, extent: u16) -> u16 {
    if value < 0 {
        let back = u16::try_from(value.unsigned_abs()).unwrap_or(u16::MAX);
        extent.saturating_sub(back)
    } else {
        u16::try_from(value).unwrap_or(u16::MAX)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Char(char, Style),
    /// Right half of a double-width character.
    Continuation,
}

const BLANK: Cell = Cell::Char(' ', Style::new());

#[derive(Debug, Clone)]
pub struct Pane {
    area: Rect,
    border: bool,
    title: Option<String>,
    lines: Vec<Vec<Cell>>,
    capacity: usize,
    scroll: usize,
    cursor: usize,
}

impl Pane {
    pub fn new(geometry: Geometry, screen: Size, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            area: geometry.resolve(screen),
            border: true,
            title: None,
            lines: Vec::with_capacity(capacity),
            capacity,
            scroll: 0,
            cursor: 0,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn without_border(mut self) -> Self {
        self.border = false;
        self
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    /// The text area inside the border. A pane without a border uses its
    /// whole area.
    pub fn viewport(&self) -> Rect {
        if !self.border {
            return self.area;
        }
        Rect {
            x: self.area.x.saturating_add(BORDER_WIDTH),
            y: self.area.y.saturating_add(BORDER_HEIGHT),
            width: self.area.width.saturating_sub(2 * BORDER_WIDTH),
            height: self.area.height.saturating_sub(2 * BORDER_HEIGHT),
        }
    }

    pub fn width(&self) -> usize {
        self.viewport().width as usize
    }

    pub fn height(&self) -> usize {
        self.viewport().height as usize
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Rows of the buffer holding content.
    pub fn content_len(&self) -> usize {
        self.lines.len()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// The row the next write without an explicit row lands on.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Plain text of a buffer row, for inspection.
    pub fn line_text(&self, row: usize) -> Option<String> {
        self.lines.get(row).map(|cells| {
            cells
                .iter()
                .filter_map(|cell| match cell {
                    Cell::Char(c, _) => Some(*c),
                    Cell::Continuation => None,
                })
                .collect()
        })
    }

    /// Style of the cell at `col` on `row`.
    pub fn style_at(&self, row: usize, col: usize) -> Option<Style> {
        match self.lines.get(row)?.get(col)? {
            Cell::Char(_, style) => Some(*style),
            Cell::Continuation => None,
        }
    }

    /// Write `text` starting at `row` (the write cursor when `None`) and
    /// `col`, returning the number of rows touched.
    ///
    /// Lines longer than the viewport wrap; the buffer grows when the text
    /// runs past its capacity. A zero-width pane stores nothing but still
    /// moves the cursor.
    pub fn write(
        &mut self,
        text: &str,
        row: Option<usize>,
        col: usize,
        style: Style,
    ) -> Result<usize, PaneError> {
        let start = row.unwrap_or(self.cursor);
        let text = text.strip_suffix('\n').unwrap_or(text);
        let width = self.width();

        if width == 0 {
            let rows = text.split('\n').count();
            self.cursor = start + rows;
            return Err(PaneError::ZeroWidth);
        }

        let mut r = start;
        let mut c = col;
        if c >= width {
            r += 1;
            c = 0;
        }

        for (i, line) in text.split('\n').enumerate() {
            if i > 0 {
                r += 1;
                c = 0;
            }
            self.ensure_row(r);

            for ch in line.chars() {
                if ch == '\t' {
                    let stop = (c / TAB_STOP + 1) * TAB_STOP;
                    while c < stop.min(width) {
                        self.put(r, c, ' ', 1, style);
                        c += 1;
                    }
                    continue;
                }

                let w = match ch.width() {
                    Some(w) if w > 0 && w <= width => w,
                    _ => continue,
                };
                if c + w > width {
                    r += 1;
                    c = 0;
                    self.ensure_row(r);
                }
                self.put(r, c, ch, w, style);
                c += w;
            }
        }

        self.cursor = r + 1;
        Ok(r + 1 - start)
    }

    fn ensure_row(&mut self, row: usize) {
        if row >= self.capacity {
            let grown = (self.capacity + GROW_STEP).max(row + 1);
            tracing::trace!(from = self.capacity, to = grown, "pane buffer grown");
            self.lines.reserve(grown.saturating_sub(self.lines.len()));
            self.capacity = grown;
        }
        if row >= self.lines.len() {
            self.lines.resize(row + 1, Vec::new());
        }
    }

    fn put(&mut self, row: usize, col: usize, ch: char, w: usize, style: Style) {
        let cells = &mut self.lines[row];
        if cells.len() < col + w {
            cells.resize(col + w, BLANK);
        }

        // Never leave half of a wide character behind
        if cells[col] == Cell::Continuation && col > 0 {
            cells[col - 1] = BLANK;
        }
        if cells.get(col + w) == Some(&Cell::Continuation) {
            cells[col + w] = BLANK;
        }

        cells[col] = Cell::Char(ch, style);
        for cell in &mut cells[col + 1..col + w] {
            *cell = Cell::Continuation;
        }
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height())
    }

    /// Scroll so that `position` is the first visible row, within bounds.
    /// Returns whether the visible window moved.
    pub fn scroll_to(&mut self, position: usize) -> bool {
        let old = self.scroll;
        self.scroll = position.min(self.max_scroll());
        self.scroll != old
    }

    pub fn scroll_by(&mut self, delta: isize) -> bool {
        let position = if delta < 0 {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
        self.scroll_to(position)
    }

    /// Keep the scroll offset at or after `first_line` and such that
    /// `last_line` is the last visible row at most. The content bounds are
    /// applied last and always hold.
    pub fn constrain_scroll(&mut self, first_line: Option<usize>, last_line: Option<usize>) {
        let mut scroll = self.scroll;
        if let Some(first) = first_line {
            scroll = scroll.max(first);
        }
        if let Some(last) = last_line {
            scroll = scroll.min(last.saturating_sub(self.height()));
        }
        self.scroll = scroll.min(self.max_scroll());
    }

    /// Scroll as little as possible to bring `row` into view.
    pub fn reveal(&mut self, row: usize) {
        let height = self.height();
        self.constrain_scroll(Some((row + 1).saturating_sub(height)), Some(row + height));
    }

    /// Drop all content. Geometry and scroll offset are kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.cursor = 0;
    }

    /// Move and resize the pane. Content is dropped and must be written again.
    pub fn resize(
        &mut self,
        height: i32,
        width: i32,
        row: Option<i32>,
        col: Option<i32>,
        screen: Size,
    ) {
        let geometry = Geometry {
            height,
            width,
            row: row.unwrap_or(self.area.y as i32),
            col: col.unwrap_or(self.area.x as i32),
        };
        self.area = geometry.resolve(screen);
        self.lines.clear();
        self.scroll = 0;
        self.cursor = 0;
    }

    /// Draw the border, title and visible rows into `buf`.
    ///
    /// Whatever falls outside `buf` is skipped and reported as
    /// [`PaneError::Clipped`], or [`PaneError::Offscreen`] when nothing fits.
    pub fn refresh(&self, buf: &mut Buffer) -> Result<(), PaneError> {
        if self.area.is_empty() {
            return Ok(());
        }

        let visible = self.area.intersection(*buf.area());
        if visible.is_empty() {
            return Err(PaneError::Offscreen);
        }

        let mut scratch = Buffer::empty(self.area);
        if self.border {
            Block::bordered().render(self.area, &mut scratch);
        }
        if let Some(title) = &self.title {
            self.draw_title(title, &mut scratch);
        }

        let viewport = self.viewport();
        for offset in 0..viewport.height {
            let Some(cells) = self.lines.get(self.scroll + offset as usize) else {
                break;
            };
            scratch.set_line(
                viewport.x,
                viewport.y + offset,
                &row_line(cells),
                viewport.width,
            );
        }

        for y in visible.top()..visible.bottom() {
            for x in visible.left()..visible.right() {
                let pos = Position::new(x, y);
                if let (Some(src), Some(dst)) = (scratch.cell(pos), buf.cell_mut(pos)) {
                    *dst = src.clone();
                }
            }
        }

        if visible != self.area {
            return Err(PaneError::Clipped);
        }
        Ok(())
    }

    fn draw_title(&self, title: &str, scratch: &mut Buffer) {
        let room = self.area.width as usize;
        let mut clipped = String::new();
        let mut used = 0;
        for ch in title.chars() {
            let w = ch.width().unwrap_or(0);
            if used + w > room {
                break;
            }
            clipped.push(ch);
            used += w;
        }

        let x = self.area.x + ((room - used) / 2) as u16;
        scratch.set_stringn(x, self.area.y, &clipped, used, Style::default());
    }
}

fn row_line(cells: &[Cell]) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut text = String::new();
    let mut current = Style::default();

    for cell in cells {
        let Cell::Char(ch, style) = cell else {
            continue;
        };
        if *style != current && !text.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut text), current));
        }
        current = *style;
        text.push(*ch);
    }
    if !text.is_empty() {
        spans.push(Span::styled(text, current));
    }

    Line::from(spans)
}
