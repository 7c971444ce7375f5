//! Fetch, parse and reconcile a single feed.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::app::Result;
use crate::domain::{Feed, FeedUpdate};
use crate::fetcher::Fetcher;
use crate::normalizer::Normalizer;
use crate::store::{MergeStats, Store};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    pub merged: MergeStats,
    pub skipped: usize,
}

pub struct Refresher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    normalizer: Normalizer,
    timeout: Duration,
}

impl Refresher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, timeout: Duration) -> Self {
        Self {
            fetcher,
            normalizer: Normalizer::new(),
            timeout,
        }
    }

    /// Refresh `feed` in place.
    ///
    /// Progress and failures are reported through `log`. On any failure the
    /// store is left untouched so that stale data stays readable.
    pub async fn refresh<S: Store + ?Sized>(
        &self,
        store: &S,
        feed: &mut Feed,
        log: &mut dyn FnMut(String),
    ) -> Result<RefreshReport> {
        log(format!("Refreshing {}...", feed.name));

        let body = match self.fetcher.fetch(&feed.url, self.timeout).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(url = %feed.url, error = %e, "refresh failed");
                log(format!("Unable to refresh {}: {}", feed.name, e));
                return Err(e);
            }
        };

        let normalized = match self.normalizer.normalize(&body) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::warn!(url = %feed.url, error = %e, "unparseable feed");
                log(format!("Unable to refresh {}: {}", feed.name, e));
                return Err(e);
            }
        };

        if normalized.skipped > 0 {
            log(format!(
                "Skipped {} malformed entries in {}.",
                normalized.skipped, feed.name
            ));
        }

        let now = Utc::now();
        let update = FeedUpdate {
            main_url: normalized.meta.link,
            description: normalized.meta.description,
            last_refresh: Some(now),
        };

        let stored = store
            .merge_entries(feed.id, &normalized.entries, now)
            .and_then(|merged| store.update_feed(feed.id, &update).map(|()| merged));
        let merged = match stored {
            Ok(merged) => merged,
            Err(e) => {
                tracing::error!(url = %feed.url, error = %e, "could not store feed");
                log(format!("Unable to refresh {}: {}", feed.name, e));
                return Err(e);
            }
        };

        if let Some(main_url) = update.main_url {
            feed.main_url = main_url;
        }
        if let Some(description) = update.description {
            feed.description = description;
        }
        feed.last_refresh = Some(now);

        tracing::info!(
            url = %feed.url,
            inserted = merged.inserted,
            updated = merged.updated,
            "feed refreshed"
        );

        Ok(RefreshReport {
            merged,
            skipped: normalized.skipped,
        })
    }
}
