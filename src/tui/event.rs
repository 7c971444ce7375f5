use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::layout::Size;

use crate::app::Result;

#[derive(Debug, PartialEq, Eq)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize(Size),
}

/// Blocks on the terminal until something the loop reacts to arrives.
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Wait for the next key press or resize. Key releases, mouse and focus
    /// events are dropped.
    pub fn next(&self) -> Result<AppEvent> {
        loop {
            if let Some(event) = classify(event::read()?) {
                return Ok(event);
            }
        }
    }
}

fn classify(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Resize(cols, rows) => Some(AppEvent::Resize(Size::new(cols, rows))),
        _ => None,
    }
}

/// Everything a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Open,
    NextItem,
    PrevItem,
    NextFeed,
    PrevFeed,
    ScrollUp,
    ScrollDown,
    ToggleRead,
    ToggleStar,
    OpenInBrowser,
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEventState, KeyModifiers};

    fn key(kind: KeyEventKind) -> KeyEvent {
        KeyEvent {
            code: KeyCode::Char('j'),
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_only_presses_and_resizes_wake_the_loop() {
        let press = key(KeyEventKind::Press);
        assert_eq!(classify(Event::Key(press)), Some(AppEvent::Key(press)));
        assert_eq!(
            classify(Event::Resize(100, 40)),
            Some(AppEvent::Resize(Size::new(100, 40)))
        );

        assert_eq!(classify(Event::Key(key(KeyEventKind::Release))), None);
        assert_eq!(classify(Event::Key(key(KeyEventKind::Repeat))), None);
        assert_eq!(classify(Event::FocusGained), None);
    }
}
