use chrono::Utc;
use feed_rs::model;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TreadError};
use crate::domain::Entry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedMeta {
    pub title: Option<String>,
    pub link: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Normalized {
    pub meta: FeedMeta,
    pub entries: Vec<Entry>,
    /// Entries dropped because nothing could identify them.
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, body: &[u8]) -> Result<Normalized> {
        let feed = parser::parse(body).map_err(|e| TreadError::FeedParse(e.to_string()))?;

        let meta = FeedMeta {
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            link: feed.links.first().map(|l| l.href.clone()),
            description: feed
                .description
                .map(|d| decode_html_entities(&d.content).to_string()),
        };

        let mut entries = Vec::with_capacity(feed.entries.len());
        let mut skipped = 0;
        for entry in feed.entries {
            match Self::normalize_entry(entry) {
                Some(entry) => entries.push(entry),
                None => skipped += 1,
            }
        }

        Ok(Normalized {
            meta,
            entries,
            skipped,
        })
    }

    fn normalize_entry(entry: model::Entry) -> Option<Entry> {
        let title = entry
            .title
            .map(|t| decode_html_entities(&t.content).to_string())
            .unwrap_or_default();
        let url = entry
            .links
            .first()
            .map(|l| l.href.clone())
            .unwrap_or_default();

        let guid = if !entry.id.trim().is_empty() {
            entry.id
        } else if !url.is_empty() || !title.is_empty() {
            Entry::fallback_guid(&url, &title)
        } else {
            tracing::debug!("skipping entry with no id, link or title");
            return None;
        };

        // Rich content first, the short summary otherwise
        let content = entry
            .content
            .and_then(|c| c.body)
            .or_else(|| entry.summary.map(|s| s.content))
            .unwrap_or_default();

        Some(Entry {
            guid,
            title,
            url,
            date: entry
                .published
                .or(entry.updated)
                .map(|dt| dt.with_timezone(&Utc)),
            content,
        })
    }
}
