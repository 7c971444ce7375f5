use std::io;
use std::sync::Arc;

use crate::app::error::Result;
use crate::config::{Config, KeyMap};
use crate::domain::Feed;
use crate::fetcher::http_fetcher::HttpFetcher;
use crate::fetcher::Fetcher;
use crate::refresher::Refresher;
use crate::renderer::ContentRenderer;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Hands a URL to the system browser.
pub type UrlOpener = Box<dyn Fn(&str) -> io::Result<()> + Send + Sync>;

pub struct AppContext {
    pub config: Config,
    pub keys: KeyMap,
    pub store: Arc<SqliteStore>,
    pub fetcher: Arc<dyn Fetcher + Send + Sync>,
    pub refresher: Refresher,
    pub renderer: ContentRenderer,
    pub opener: UrlOpener,
}

impl AppContext {
    /// Open the configured database and build the HTTP stack.
    pub fn new(config: Config) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(config.retries)?);
        Self::with_parts(config, store, fetcher)
    }

    /// Context around an in-memory database, for tests and dry runs.
    pub fn in_memory(config: Config, fetcher: Arc<dyn Fetcher + Send + Sync>) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        Self::with_parts(config, store, fetcher)
    }

    pub fn with_parts(
        config: Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
    ) -> Result<Self> {
        let keys = config.key_map()?;
        let refresher = Refresher::new(fetcher.clone(), config.timeout());
        let renderer = ContentRenderer::new(
            config.backend(),
            config.image_options(),
            fetcher.clone(),
            config.timeout(),
        );

        Ok(Self {
            config,
            keys,
            store,
            fetcher,
            refresher,
            renderer,
            opener: Box::new(|url: &str| open::that(url)),
        })
    }

    pub fn with_opener(mut self, opener: UrlOpener) -> Self {
        self.opener = opener;
        self
    }

    /// The configured feeds in configuration order, created in the store on
    /// first sight.
    pub fn sync_feeds(&self) -> Result<Vec<Feed>> {
        self.config
            .feeds
            .iter()
            .map(|f| self.store.ensure_feed(f.url.trim(), f.name.as_deref()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedConfig;
    use crate::refresher::tests::MockFetcher;

    fn config() -> Config {
        Config {
            feeds: vec![
                FeedConfig {
                    url: "https://example.com/a.xml".into(),
                    name: Some("A".into()),
                },
                FeedConfig {
                    url: "https://example.com/b.xml".into(),
                    name: None,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_sync_feeds_creates_in_config_order() {
        let ctx = AppContext::in_memory(config(), Arc::new(MockFetcher::default())).unwrap();

        let feeds = ctx.sync_feeds().unwrap();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].name, "A");
        assert_eq!(feeds[1].name, "https://example.com/b.xml");

        let again = ctx.sync_feeds().unwrap();
        assert_eq!(feeds, again);
    }

    #[test]
    fn test_configured_name_overrides_stored() {
        let mut config = config();
        let ctx = AppContext::in_memory(config.clone(), Arc::new(MockFetcher::default())).unwrap();
        ctx.sync_feeds().unwrap();

        config.feeds[0].name = Some("Renamed".into());
        let ctx = AppContext::with_parts(config, ctx.store.clone(), ctx.fetcher.clone()).unwrap();
        let feeds = ctx.sync_feeds().unwrap();
        assert_eq!(feeds[0].name, "Renamed");
    }

    #[test]
    fn test_new_opens_database_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("data").join("tread.db");
        let config = Config {
            database: db.to_string_lossy().into_owned(),
            ..config()
        };

        let ctx = AppContext::new(config).unwrap();
        ctx.sync_feeds().unwrap();
        assert!(db.exists());
    }
}
