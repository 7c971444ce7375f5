use std::collections::VecDeque;

use chrono::{DateTime, Local};
use ratatui::style::Style;

use crate::tui::pane::Pane;

const DEFAULT_LIMIT: usize = 100;

/// Timestamped status messages, newest last.
///
/// The log outlives the messages pane, which is rebuilt on every resize, so
/// the pane is rewritten from here whenever either one changes.
#[derive(Debug, Clone)]
pub struct MessageLog {
    entries: VecDeque<String>,
    limit: usize,
    changed: bool,
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::with_limit(DEFAULT_LIMIT)
    }
}

impl MessageLog {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
            changed: false,
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        self.push_at(message, Local::now());
    }

    pub fn push_at(&mut self, message: impl Into<String>, at: DateTime<Local>) {
        let message = message.into();
        tracing::debug!(target: "tread::messages", "{message}");

        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries
            .push_back(format!("{}: {}", at.format("%Y-%m-%d %H:%M"), message));
        self.changed = true;
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Force the next [`MessageLog::take_changed`] to report a change.
    pub fn touch(&mut self) {
        self.changed = true;
    }

    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Rewrite `pane` with every entry and scroll to the newest.
    pub fn write_to(&self, pane: &mut Pane) {
        pane.clear();
        for entry in &self.entries {
            if let Err(e) = pane.write(entry, None, 0, Style::default()) {
                tracing::trace!(error = %e, "message not drawn");
            }
        }
        pane.scroll_to(pane.content_len());
    }
}
