use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::app::{Result, TreadError};
use crate::fetcher::Fetcher;

pub const DEFAULT_RETRIES: u32 = 10;

pub struct HttpFetcher {
    client: Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(retries: u32) -> Result<Self> {
        let client = Client::builder()
            .gzip(true)
            .brotli(true)
            .user_agent(concat!("tread/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, retries })
    }

    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let response = self.client.get(url).timeout(timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TreadError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    /// GET `url`, retrying connection failures and timeouts up to the
    /// configured count. HTTP error statuses are returned immediately.
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url, timeout).await {
                Err(TreadError::Network(e))
                    if attempt < self.retries && (e.is_connect() || e.is_timeout()) =>
                {
                    attempt += 1;
                    tracing::debug!(url, attempt, error = %e, "retrying fetch");
                }
                result => return result,
            }
        }
    }
}
