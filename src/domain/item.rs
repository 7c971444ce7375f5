use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub feed_id: i64,
    pub guid: String,
    pub title: String,
    pub url: String,
    pub date: DateTime<Utc>,
    pub content: String,
    pub read: bool,
    pub starred: bool,
}

impl Item {
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }
}

/// An entry as parsed from upstream, before reconciliation with the store.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub guid: String,
    pub title: String,
    pub url: String,
    pub date: Option<DateTime<Utc>>,
    pub content: String,
}

impl Entry {
    /// Deterministic stand-in for entries published without a guid.
    pub fn fallback_guid(link: &str, title: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(link.as_bytes());
        hasher.update(title.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_guid_deterministic() {
        let id1 = Entry::fallback_guid("https://example.com/a", "A");
        let id2 = Entry::fallback_guid("https://example.com/a", "A");
        assert_eq!(id1, id2);
    }

    #[test]
    fn test_fallback_guid_different_inputs() {
        let id1 = Entry::fallback_guid("https://example.com/a", "A");
        let id2 = Entry::fallback_guid("https://example.com/b", "A");
        let id3 = Entry::fallback_guid("https://example.com/a", "B");
        assert_ne!(id1, id2);
        assert_ne!(id1, id3);
    }

    #[test]
    fn test_fallback_guid_is_hex_sha256() {
        let id = Entry::fallback_guid("https://example.com/a", "A");
        assert_eq!(id.len(), 64);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_display_title_without_title() {
        let item = Item {
            id: 1,
            feed_id: 1,
            guid: "g".into(),
            title: String::new(),
            url: String::new(),
            date: Utc::now(),
            content: String::new(),
            read: false,
            starred: false,
        };
        assert_eq!(item.display_title(), "(Untitled)");
    }
}
