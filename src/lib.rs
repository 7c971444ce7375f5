//! # tread
//!
//! A simple terminal RSS/Atom feed reader.
//!
//! ## Architecture
//!
//! ```text
//! Fetcher → Normalizer → Store → Renderer → TUI
//! ```
//!
//! Feeds listed in the configuration file are fetched when they are selected
//! and stale, merged into a SQLite database by guid, and shown in a two-pane
//! terminal interface: the feed list on the left, the items of the selected
//! feed with the open article on the right.
//!
//! ## Quick Start
//!
//! ```bash
//! # Read feeds listed in ~/.tread.toml
//! tread
//!
//! # Use another configuration file
//! tread ~/work-feeds.toml
//!
//! # Refresh every feed and exit
//! tread --update
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all components:
/// store, fetcher, refresher, renderer, key map and browser opener.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration file loading.
///
/// Loads from `~/.tread.toml`, supporting:
/// - The feed list
/// - Refresh, network and display settings
/// - Custom keybindings
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a subscribed feed and when it was last refreshed
/// - [`Item`](domain::Item): a stored entry with read/starred flags
/// - [`Entry`](domain::Entry): an entry as parsed from a fetched feed
pub mod domain;

/// HTTP fetching with timeouts and retries.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for fetching URLs
/// - [`HttpFetcher`](fetcher::http_fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0 into
/// [`Entry`](domain::Entry) values.
pub mod normalizer;

/// Fetch, parse and merge one feed.
pub mod refresher;

/// Article HTML to fixed-width text.
pub mod renderer;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;

/// Terminal user interface.
///
/// Five panes drawn with ratatui: logo, feeds, key legend and messages down
/// the left and bottom, article list and content on the right.
pub mod tui;
