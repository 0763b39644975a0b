use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::external::catalog_provider::{CatalogProvider, CatalogProviderError};
use crate::models::Stock;

/// Retry policy for catalog fetches. `max_retries == 0` means one attempt only.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Exponential backoff with up to 50% random jitter added.
    fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let exp_ms = base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter_ms = if exp_ms > 0 {
            rand::random_range(0..=exp_ms / 2)
        } else {
            0
        };
        Duration::from_millis(exp_ms + jitter_ms)
    }
}

/// Fetches the catalog with a single GET against a fixed upstream URL.
pub struct HttpCatalogProvider {
    client: reqwest::Client,
    url: url::Url,
    retry: RetryPolicy,
}

impl HttpCatalogProvider {
    pub fn new(
        catalog_url: &str,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogProviderError> {
        let url = url::Url::parse(catalog_url)
            .map_err(|e| CatalogProviderError::InvalidUrl(format!("{}: {}", catalog_url, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CatalogProviderError::Network(e.to_string()))?;

        Ok(Self { client, url, retry })
    }

    async fn fetch_once(&self) -> Result<Vec<Stock>, CatalogProviderError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| CatalogProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogProviderError::Status(status.as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CatalogProviderError::Network(e.to_string()))?;

        Stock::decode_catalog(&body).map_err(|e| CatalogProviderError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CatalogProvider for HttpCatalogProvider {
    async fn fetch_catalog(&self) -> Result<Vec<Stock>, CatalogProviderError> {
        let mut attempt = 0;

        loop {
            match self.fetch_once().await {
                Ok(stocks) => {
                    info!("✓ Fetched {} stocks from {}", stocks.len(), self.url);
                    return Ok(stocks);
                }
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        "Catalog fetch failed ({}), retrying in {}ms (attempt {}/{})",
                        e,
                        delay.as_millis(),
                        attempt,
                        self.retry.max_retries
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    warn!("✗ Catalog fetch from {} failed: {}", self.url, e);
                    return Err(e);
                }
            }
        }
    }
}
