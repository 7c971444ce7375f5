//! Keybinding configuration.
//!
//! Key names are case-insensitive: both the configured names and incoming key
//! presses are upper-cased before they are compared, so `j` and `J` are the
//! same binding. Curses-style names such as `KEY_UP` are accepted too.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::Deserialize;

use crate::config::ConfigError;
use crate::tui::event::Action;

/// One key name per bindable action.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    pub open: String,
    pub next_item: String,
    pub prev_item: String,
    pub next_feed: String,
    pub prev_feed: String,
    pub scroll_up: String,
    pub scroll_down: String,
    pub toggle_read: String,
    pub toggle_star: String,
    pub open_in_browser: String,
    pub quit: String,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            open: " ".to_string(),
            next_item: "J".to_string(),
            prev_item: "K".to_string(),
            next_feed: "L".to_string(),
            prev_feed: "H".to_string(),
            scroll_up: "KEY_UP".to_string(),
            scroll_down: "KEY_DOWN".to_string(),
            toggle_read: "R".to_string(),
            toggle_star: "S".to_string(),
            open_in_browser: "O".to_string(),
            quit: "Q".to_string(),
        }
    }
}

impl KeyConfig {
    fn entries(&self) -> [(Action, &str); 11] {
        [
            (Action::Open, &self.open),
            (Action::NextItem, &self.next_item),
            (Action::PrevItem, &self.prev_item),
            (Action::NextFeed, &self.next_feed),
            (Action::PrevFeed, &self.prev_feed),
            (Action::ScrollUp, &self.scroll_up),
            (Action::ScrollDown, &self.scroll_down),
            (Action::ToggleRead, &self.toggle_read),
            (Action::ToggleStar, &self.toggle_star),
            (Action::OpenInBrowser, &self.open_in_browser),
            (Action::Quit, &self.quit),
        ]
    }

    /// Parse every binding, rejecting unknown names and keys bound twice.
    pub fn key_map(&self) -> Result<KeyMap, ConfigError> {
        let mut bindings: Vec<(KeyBinding, Action)> = Vec::new();

        for (action, name) in self.entries() {
            let binding = parse_key_string(name).map_err(ConfigError::Keys)?;
            if let Some((_, other)) = bindings.iter().find(|(b, _)| *b == binding) {
                return Err(ConfigError::Keys(format!(
                    "{} is bound to both {:?} and {:?}",
                    binding.label(),
                    other,
                    action
                )));
            }
            bindings.push((binding, action));
        }

        Ok(KeyMap { bindings })
    }
}

/// Validated bindings, looked up by action or by key press.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(KeyBinding, Action)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        KeyConfig::default()
            .key_map()
            .unwrap_or(KeyMap { bindings: Vec::new() })
    }
}

impl KeyMap {
    /// Get the action for a key press. Ctrl+C always quits.
    pub fn action_for(&self, key: &KeyEvent) -> Option<Action> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Action::Quit);
        }

        self.bindings
            .iter()
            .find(|(binding, _)| binding.matches(key))
            .map(|(_, action)| *action)
    }

    pub fn binding_for(&self, action: Action) -> Option<&KeyBinding> {
        self.bindings
            .iter()
            .find(|(_, a)| *a == action)
            .map(|(binding, _)| binding)
    }

    /// Display label for the legend pane, `?` when unbound.
    pub fn label(&self, action: Action) -> String {
        self.binding_for(action)
            .map(KeyBinding::label)
            .unwrap_or_else(|| "?".to_string())
    }
}

/// A parsed key binding with code and modifiers. Character codes are always
/// upper case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyBinding {
    /// Check if this binding matches a key event. Shift is ignored because
    /// case is already folded.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let code = match key.code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_uppercase()),
            code => code,
        };
        self.code == code && self.modifiers == (key.modifiers & !KeyModifiers::SHIFT)
    }

    pub fn label(&self) -> String {
        let key = match self.code {
            KeyCode::Char(' ') => "SPACE".to_string(),
            KeyCode::Char(c) => c.to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Up => "UP".to_string(),
            KeyCode::Down => "DOWN".to_string(),
            KeyCode::Left => "LEFT".to_string(),
            KeyCode::Right => "RIGHT".to_string(),
            KeyCode::PageUp => "PGUP".to_string(),
            KeyCode::PageDown => "PGDN".to_string(),
            KeyCode::Home => "HOME".to_string(),
            KeyCode::End => "END".to_string(),
            KeyCode::Enter => "ENTER".to_string(),
            KeyCode::Tab => "TAB".to_string(),
            KeyCode::BackTab => "BACKTAB".to_string(),
            KeyCode::Backspace => "BACKSPACE".to_string(),
            KeyCode::Delete => "DEL".to_string(),
            KeyCode::Esc => "ESC".to_string(),
            other => format!("{other:?}").to_uppercase(),
        };

        let mut label = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            label.push_str("CTRL+");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            label.push_str("ALT+");
        }
        label.push_str(&key);
        label
    }
}

/// Parse a key name into a KeyBinding.
///
/// Supported formats:
/// - Single characters: "j", "J", "1", "/", " " (space)
/// - Named keys, with or without a `KEY_` prefix: "Space", "Enter", "Tab",
///   "BackTab", "Backspace", "Delete", "Home", "End", "PageUp"/"PPage",
///   "PageDown"/"NPage", "Up", "Down", "Left", "Right", "Esc", "F1"-"F12"
/// - With modifiers: "Ctrl+n", "Alt+j"
pub fn parse_key_string(s: &str) -> Result<KeyBinding, String> {
    // A lone space is a key, not padding
    if s == " " {
        return Ok(KeyBinding {
            code: KeyCode::Char(' '),
            modifiers: KeyModifiers::NONE,
        });
    }

    let s = s.trim().to_uppercase();
    if s.is_empty() {
        return Err("Empty key name".to_string());
    }
    let parts: Vec<&str> = if s == "+" { vec!["+"] } else { s.split('+').collect() };

    let mut modifiers = KeyModifiers::NONE;
    for part in &parts[..parts.len() - 1] {
        match *part {
            "CTRL" | "CONTROL" => modifiers |= KeyModifiers::CONTROL,
            "ALT" => modifiers |= KeyModifiers::ALT,
            _ => return Err(format!("Unknown modifier: {}", part)),
        }
    }

    let code = parse_key_code(parts[parts.len() - 1])?;

    Ok(KeyBinding { code, modifiers })
}

fn parse_key_code(s: &str) -> Result<KeyCode, String> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }

    let name = s.strip_prefix("KEY_").unwrap_or(s);

    if let Some(n) = name.strip_prefix('F') {
        if let Ok(n @ 1..=12) = n.parse::<u8>() {
            return Ok(KeyCode::F(n));
        }
    }

    match name {
        "SPACE" => Ok(KeyCode::Char(' ')),
        "ENTER" | "RETURN" => Ok(KeyCode::Enter),
        "TAB" => Ok(KeyCode::Tab),
        "BACKTAB" | "BTAB" => Ok(KeyCode::BackTab),
        "BACKSPACE" | "BS" => Ok(KeyCode::Backspace),
        "DELETE" | "DEL" | "DC" => Ok(KeyCode::Delete),
        "HOME" => Ok(KeyCode::Home),
        "END" => Ok(KeyCode::End),
        "PAGEUP" | "PGUP" | "PPAGE" => Ok(KeyCode::PageUp),
        "PAGEDOWN" | "PGDN" | "NPAGE" => Ok(KeyCode::PageDown),
        "UP" => Ok(KeyCode::Up),
        "DOWN" => Ok(KeyCode::Down),
        "LEFT" => Ok(KeyCode::Left),
        "RIGHT" => Ok(KeyCode::Right),
        "ESC" | "ESCAPE" => Ok(KeyCode::Esc),
        _ => Err(format!("Unknown key: {}", s)),
    }
}
