use chrono::Utc;
use ratatui::layout::Size;

use crate::app::{AppContext, Result};
use crate::domain::{Feed, Item};
use crate::store::Store;
use crate::tui::event::Action;
use crate::tui::messages::MessageLog;
use crate::tui::screen::Screen;

const NO_FEEDS: &str =
    "No feeds to display. Add [[feeds]] entries to the configuration file and restart.";

/// Article text rendered for one item at one width.
struct RenderedItem {
    item_id: i64,
    width: usize,
    text: String,
}

/// Selection and redraw state of the reader.
pub struct TuiApp {
    pub feeds: Vec<Feed>,
    /// Items of the selected feed, newest first.
    pub items: Vec<Item>,
    pub feed_index: usize,
    pub item_index: usize,
    pub item_open: bool,
    pub autoscroll_to_item: bool,
    pub redraw_feeds: bool,
    pub redraw_content: bool,
    pub should_quit: bool,
    pub log: MessageLog,
    rendered: Option<RenderedItem>,
}

impl Default for TuiApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TuiApp {
    pub fn new() -> Self {
        Self {
            feeds: Vec::new(),
            items: Vec::new(),
            feed_index: 0,
            item_index: 0,
            item_open: false,
            autoscroll_to_item: false,
            redraw_feeds: true,
            redraw_content: true,
            should_quit: false,
            log: MessageLog::default(),
            rendered: None,
        }
    }

    pub fn selected_feed(&self) -> Option<&Feed> {
        self.feeds.get(self.feed_index)
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.items.get(self.item_index)
    }

    /// Load the configured feeds, refresh the first one if it is stale and
    /// show its items.
    pub async fn start(&mut self, ctx: &AppContext) -> Result<()> {
        self.feeds = ctx.sync_feeds()?;
        self.feed_index = 0;
        self.item_index = 0;

        if self.feeds.is_empty() {
            self.log.push(NO_FEEDS);
            return Ok(());
        }

        self.refresh_if_stale(ctx).await;
        self.reload_items(ctx)?;
        self.redraw_feeds = true;
        self.redraw_content = true;
        Ok(())
    }

    /// Apply one key action. Store failures are reported in the message log
    /// and leave the in-memory state as it was.
    pub async fn handle_action(&mut self, action: Action, ctx: &AppContext, screen: &mut Screen) {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }
            Action::NextItem => self.move_item(1, ctx),
            Action::PrevItem => self.move_item(-1, ctx),
            Action::NextFeed => self.move_feed(1, ctx, screen).await,
            Action::PrevFeed => self.move_feed(-1, ctx, screen).await,
            Action::Open => {
                if self.selected_item().is_none() {
                    return;
                }
                self.item_open = !self.item_open;
                if self.item_open {
                    if ctx.config.mark_read_on_view {
                        self.mark_selected_read(ctx);
                    }
                } else {
                    // The title may have scrolled out of view with the article
                    self.autoscroll_to_item = true;
                }
                self.redraw_content = true;
            }
            Action::ScrollUp => {
                screen.content.scroll_by(-(ctx.config.scroll_lines as isize));
            }
            Action::ScrollDown => {
                screen.content.scroll_by(ctx.config.scroll_lines as isize);
            }
            Action::OpenInBrowser => {
                let Some(item) = self.items.get(self.item_index) else {
                    return;
                };
                if item.url.is_empty() {
                    let message = format!("{} has no link.", item.display_title());
                    self.log.push(message);
                } else if let Err(e) = (ctx.opener)(&item.url) {
                    tracing::warn!(url = %item.url, error = %e, "could not open browser");
                    let message = format!("Unable to open {}: {}", item.url, e);
                    self.log.push(message);
                }
            }
            Action::ToggleRead => {
                if let Some(item) = self.items.get_mut(self.item_index) {
                    match ctx.store.set_read(item.id, !item.read) {
                        Ok(()) => {
                            item.read = !item.read;
                            self.redraw_feeds = true;
                            self.redraw_content = true;
                        }
                        Err(e) => {
                            tracing::error!(item = item.id, error = %e, "could not save read flag");
                            self.log.push(format!("Unable to save {}: {}", item.display_title(), e));
                        }
                    }
                }
            }
            Action::ToggleStar => {
                if let Some(item) = self.items.get_mut(self.item_index) {
                    match ctx.store.set_starred(item.id, !item.starred) {
                        Ok(()) => {
                            item.starred = !item.starred;
                            self.redraw_feeds = true;
                            self.redraw_content = true;
                        }
                        Err(e) => {
                            tracing::error!(item = item.id, error = %e, "could not save star flag");
                            self.log.push(format!("Unable to save {}: {}", item.display_title(), e));
                        }
                    }
                }
            }
        }
    }

    /// Rebuild the screen for a new terminal size and redraw everything.
    pub fn resize(&mut self, screen: &mut Screen, size: Size) {
        tracing::debug!(cols = size.width, rows = size.height, "terminal resized");
        screen.resize(size);
        self.redraw_feeds = true;
        self.redraw_content = true;
        self.autoscroll_to_item = true;
        self.log.touch();
    }

    fn move_item(&mut self, step: isize, ctx: &AppContext) {
        let count = self.items.len();
        if count == 0 {
            return;
        }

        self.item_index = step_index(self.item_index, step, count);
        self.autoscroll_to_item = true;
        self.redraw_content = true;

        if self.item_open && ctx.config.mark_read_on_view {
            self.mark_selected_read(ctx);
        }
    }

    async fn move_feed(&mut self, step: isize, ctx: &AppContext, screen: &mut Screen) {
        let count = self.feeds.len();
        if count == 0 {
            return;
        }

        self.feed_index = step_index(self.feed_index, step, count);
        self.item_index = 0;
        self.item_open = false;
        self.redraw_feeds = true;
        self.redraw_content = true;
        screen.content.scroll_to(0);

        self.refresh_if_stale(ctx).await;
        if let Err(e) = self.reload_items(ctx) {
            tracing::error!(error = %e, "could not load items");
            self.items.clear();
            self.log.push(format!("Unable to load items: {e}"));
        }
    }

    async fn refresh_if_stale(&mut self, ctx: &AppContext) {
        let Some(feed) = self.feeds.get_mut(self.feed_index) else {
            return;
        };
        if !feed.needs_refresh(ctx.config.refresh_interval(), Utc::now()) {
            return;
        }

        let log = &mut self.log;
        let refreshed = ctx
            .refresher
            .refresh(ctx.store.as_ref(), feed, &mut |m| log.push(m))
            .await;
        // Failures were reported through the log; stale items stay readable
        if refreshed.is_ok() {
            self.rendered = None;
        }
        self.redraw_feeds = true;
    }

    fn reload_items(&mut self, ctx: &AppContext) -> Result<()> {
        self.items = match self.selected_feed() {
            Some(feed) => ctx.store.get_items_by_feed(feed.id)?,
            None => Vec::new(),
        };
        if self.item_index >= self.items.len() {
            self.item_index = 0;
        }
        Ok(())
    }

    fn mark_selected_read(&mut self, ctx: &AppContext) {
        let Some(item) = self.items.get_mut(self.item_index) else {
            return;
        };
        if item.read {
            return;
        }
        match ctx.store.set_read(item.id, true) {
            Ok(()) => {
                item.read = true;
                self.redraw_feeds = true;
            }
            Err(e) => {
                tracing::error!(item = item.id, error = %e, "could not mark item read");
                self.log.push(format!("Unable to save {}: {}", item.display_title(), e));
            }
        }
    }

    /// The selected item's article as text `width` columns wide. Rendering
    /// is skipped when the same item was last rendered at the same width.
    pub async fn rendered_content(&mut self, ctx: &AppContext, width: usize) -> Option<&str> {
        let item = self.items.get(self.item_index)?;
        let cached = self
            .rendered
            .as_ref()
            .is_some_and(|r| r.item_id == item.id && r.width == width);

        if !cached {
            let item_id = item.id;
            let html = item.content.clone();
            let base = (!item.url.is_empty()).then(|| item.url.clone());

            let log = &mut self.log;
            let text = ctx
                .renderer
                .render(&html, width, base.as_deref(), &mut |m| log.push(m))
                .await;
            self.rendered = Some(RenderedItem {
                item_id,
                width,
                text,
            });
        }

        self.rendered.as_ref().map(|r| r.text.as_str())
    }
}

fn step_index(index: usize, step: isize, count: usize) -> usize {
    let count = count as isize;
    (index as isize + step).rem_euclid(count) as usize
}
