pub mod http_fetcher;

use std::time::Duration;

use async_trait::async_trait;

use crate::app::Result;

pub use http_fetcher::HttpFetcher;

/// Fetches raw bytes over the network: feed documents and article images.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>>;
}
