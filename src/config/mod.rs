//! Configuration management for tread.
//!
//! Configuration is read from `~/.tread.toml` unless another path is given on
//! the command line. In interactive mode a missing file is replaced by a
//! commented sample and the reader starts with no feeds.

pub mod keybindings;

pub use keybindings::{KeyBinding, KeyConfig, KeyMap};

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::http_fetcher::DEFAULT_RETRIES;
use crate::renderer::{Backend, ImageOptions};

/// A feed listed in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FeedConfig {
    pub url: String,
    /// Display name; the stored name (or the URL) is used when absent.
    #[serde(default)]
    pub name: Option<String>,
}

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feeds: Vec<FeedConfig>,
    pub database: String,
    /// HTTP timeout in seconds.
    pub timeout: u64,
    pub retries: u32,
    /// Minutes before a feed is considered stale.
    pub refresh: u64,
    pub buffer_lines: usize,
    pub scroll_lines: usize,
    pub unread_count: bool,
    pub mark_read_on_view: bool,
    pub parser: String,
    pub ascii_images: bool,
    pub image_blocks: bool,
    pub keys: KeyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            feeds: Vec::new(),
            database: "~/.tread.db".to_string(),
            timeout: 10,
            retries: DEFAULT_RETRIES,
            refresh: 10,
            buffer_lines: 1000,
            scroll_lines: 1,
            unread_count: false,
            mark_read_on_view: true,
            parser: "html2text".to_string(),
            ascii_images: false,
            image_blocks: false,
            keys: KeyConfig::default(),
        }
    }
}

/// What [`Config::load_or_create`] found at the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    CreatedSample,
}

impl Config {
    /// Read and validate the configuration at `path`. A missing file is an
    /// error.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Like [`Config::read`], but a missing file is replaced by the commented
    /// sample and the defaults are returned.
    pub fn load_or_create(path: &Path) -> Result<(Self, LoadStatus), ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok((Self::default(), LoadStatus::CreatedSample));
        }
        Ok((Self::read(path)?, LoadStatus::Loaded))
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        self.keys.key_map()?;
        if self.feeds.iter().any(|f| f.url.trim().is_empty()) {
            return Err(ConfigError::Invalid("feed with an empty url".into()));
        }
        if self.scroll_lines == 0 {
            return Err(ConfigError::Invalid("scroll_lines must be at least 1".into()));
        }
        Ok(())
    }

    /// Get the default config file path: `~/.tread.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".tread.toml"))
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn refresh_interval(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.refresh as i64)
    }

    pub fn backend(&self) -> Backend {
        Backend::from_name(&self.parser)
    }

    pub fn image_options(&self) -> ImageOptions {
        ImageOptions {
            enabled: self.ascii_images,
            blocks: self.image_blocks,
        }
    }

    pub fn key_map(&self) -> Result<KeyMap, ConfigError> {
        self.keys.key_map()
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> &'static str {
        r##"# tread configuration
#
# Add one [[feeds]] table per feed. The name is optional and replaces the
# title shown in the sidebar.
#
# [[feeds]]
# url = "https://blog.rust-lang.org/feed.xml"
# name = "Rust Blog"

# SQLite database holding feeds, items and read/starred flags
database = "~/.tread.db"

# HTTP timeout in seconds, and how often a failed connection is retried
timeout = 10
retries = 10

# Minutes before a feed is refreshed again when it is selected
refresh = 10

# Initial line capacity of the content pane (it grows as needed)
buffer_lines = 1000

# Lines moved per scroll key press
scroll_lines = 1

# Show "(unread, *starred)" counts next to feed names
unread_count = false

# Mark items read when they are opened or selected while open
mark_read_on_view = true

# HTML to text converter: html2text, lynx or w3m
parser = "html2text"

# Draw inline images as ASCII art, optionally with shade blocks
ascii_images = false
image_blocks = false

# Keys are case-insensitive. Use " " or "Space" for the space bar; named keys
# such as Up, Down, PageUp, Enter, Tab, Esc and F1-F12 may also be written in
# curses style (KEY_UP, KEY_NPAGE). Modifiers: "Ctrl+n", "Alt+j".
[keys]
open = " "
next_item = "J"
prev_item = "K"
next_feed = "L"
prev_feed = "H"
scroll_up = "KEY_UP"
scroll_down = "KEY_DOWN"
toggle_read = "R"
toggle_star = "S"
open_in_browser = "O"
quit = "Q"
"##
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid key binding: {0}")]
    Keys(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_deserializes() {
        let config: Config = toml::from_str(Config::default_config_content())
            .expect("Default config should be valid TOML");

        assert!(config.feeds.is_empty());
        assert_eq!(config.database, "~/.tread.db");
        assert_eq!(config.keys.open, " ");
        assert_eq!(config.keys.scroll_up, "KEY_UP");
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");

        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.retries, 10);
        assert_eq!(config.refresh_interval(), chrono::Duration::minutes(10));
        assert_eq!(config.buffer_lines, 1000);
        assert!(config.mark_read_on_view);
        assert_eq!(config.backend(), Backend::Html2Text);
    }

    #[test]
    fn test_feeds_and_partial_keys() {
        let content = r#"
parser = "w3m"
unread_count = true

[[feeds]]
url = "https://example.com/a.xml"
name = "A"

[[feeds]]
url = "https://example.com/b.xml"

[keys]
quit = "x"
"#;
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tread.toml");
        fs::write(&path, content).unwrap();

        let config = Config::read(&path).unwrap();
        assert_eq!(
            config.feeds,
            vec![
                FeedConfig {
                    url: "https://example.com/a.xml".into(),
                    name: Some("A".into())
                },
                FeedConfig {
                    url: "https://example.com/b.xml".into(),
                    name: None
                },
            ]
        );
        assert!(config.unread_count);
        assert_eq!(config.backend(), Backend::W3m);
        assert_eq!(config.keys.quit, "x");
        assert_eq!(config.keys.next_item, "J");
    }

    #[test]
    fn test_bad_key_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tread.toml");
        fs::write(&path, "[keys]\nquit = \"KEY_NOPE\"\n").unwrap();

        assert!(matches!(Config::read(&path), Err(ConfigError::Keys(_))));
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tread.toml");
        fs::write(&path, "timeout = \"soon\"\n").unwrap();

        let err = Config::read(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("tread.toml"));
    }

    #[test]
    fn test_missing_file_writes_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tread.toml");

        let (config, status) = Config::load_or_create(&path).unwrap();
        assert_eq!(status, LoadStatus::CreatedSample);
        assert!(config.feeds.is_empty());
        assert!(path.exists());

        let (_, status) = Config::load_or_create(&path).unwrap();
        assert_eq!(status, LoadStatus::Loaded);
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::read(&dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde("/tmp/x.db"), PathBuf::from("/tmp/x.db"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/.tread.db"), home.join(".tread.db"));
        }
    }
}
