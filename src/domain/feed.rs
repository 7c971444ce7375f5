use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub url: String,
    pub name: String,
    pub main_url: String,
    pub description: String,
    pub last_refresh: Option<DateTime<Utc>>,
}

impl Feed {
    /// A feed that has never been stored or refreshed. The name defaults to
    /// the URL until one is configured.
    pub fn new(url: String, name: Option<String>) -> Self {
        let name = name.unwrap_or_else(|| url.clone());
        Self {
            id: 0,
            url,
            name,
            main_url: String::new(),
            description: String::new(),
            last_refresh: None,
        }
    }

    /// Stale when never refreshed, or last refreshed more than `interval` ago.
    pub fn needs_refresh(&self, interval: Duration, now: DateTime<Utc>) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now - last > interval,
        }
    }
}

/// Channel-level fields written back after a successful refresh.
#[derive(Debug, Clone, Default)]
pub struct FeedUpdate {
    pub main_url: Option<String>,
    pub description: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_name_defaults_to_url() {
        let feed = Feed::new("https://example.com/feed.xml".into(), None);
        assert_eq!(feed.name, "https://example.com/feed.xml");

        let named = Feed::new("https://example.com/feed.xml".into(), Some("Example".into()));
        assert_eq!(named.name, "Example");
    }

    #[test]
    fn test_never_refreshed_is_stale() {
        let feed = Feed::new("https://example.com/feed.xml".into(), None);
        assert!(feed.needs_refresh(Duration::minutes(10), Utc::now()));
    }

    #[test]
    fn test_staleness_interval() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut feed = Feed::new("https://example.com/feed.xml".into(), None);

        feed.last_refresh = Some(now - Duration::minutes(5));
        assert!(!feed.needs_refresh(Duration::minutes(10), now));

        feed.last_refresh = Some(now - Duration::minutes(11));
        assert!(feed.needs_refresh(Duration::minutes(10), now));
    }
}
