pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::app::Result;
use crate::domain::{Entry, Feed, FeedUpdate, Item};

pub use sqlite::SqliteStore;

/// Outcome of reconciling fetched entries against stored items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub inserted: usize,
    pub updated: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeedCounts {
    pub unread: i64,
    pub starred: i64,
}

pub trait Store {
    // Feed operations
    fn add_feed(&self, feed: &Feed) -> Result<i64>;
    fn get_feed(&self, id: i64) -> Result<Option<Feed>>;
    fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;
    fn set_feed_name(&self, id: i64, name: &str) -> Result<()>;
    fn update_feed(&self, id: i64, update: &FeedUpdate) -> Result<()>;
    fn feed_counts(&self, feed_id: i64) -> Result<FeedCounts>;

    /// Look a feed up by URL, creating it when absent. A configured name
    /// replaces the stored one.
    fn ensure_feed(&self, url: &str, name: Option<&str>) -> Result<Feed> {
        match self.get_feed_by_url(url)? {
            Some(mut feed) => {
                if let Some(name) = name {
                    if feed.name != name {
                        self.set_feed_name(feed.id, name)?;
                        feed.name = name.to_string();
                    }
                }
                Ok(feed)
            }
            None => {
                let mut feed = Feed::new(url.to_string(), name.map(String::from));
                feed.id = self.add_feed(&feed)?;
                Ok(feed)
            }
        }
    }

    // Item operations
    fn get_item(&self, id: i64) -> Result<Option<Item>>;
    fn find_item(&self, feed_id: i64, guid: &str) -> Result<Option<Item>>;
    fn get_items_by_feed(&self, feed_id: i64) -> Result<Vec<Item>>;
    fn merge_entries(&self, feed_id: i64, entries: &[Entry], now: DateTime<Utc>)
        -> Result<MergeStats>;

    // State operations
    fn set_read(&self, item_id: i64, read: bool) -> Result<()>;
    fn set_starred(&self, item_id: i64, starred: bool) -> Result<()>;
}
