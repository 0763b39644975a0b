use async_trait::async_trait;
use thiserror::Error;

use crate::models::Stock;

#[derive(Debug, Error)]
pub enum CatalogProviderError {
    #[error("invalid catalog url: {0}")]
    InvalidUrl(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl CatalogProviderError {
    /// Transport failures and 5xx responses may succeed on a second attempt.
    /// Client errors and bad payloads will not.
    pub fn is_retryable(&self) -> bool {
        match self {
            CatalogProviderError::Network(_) => true,
            CatalogProviderError::Status(code) => *code >= 500,
            CatalogProviderError::InvalidUrl(_) | CatalogProviderError::Malformed(_) => false,
        }
    }
}

/// Source of the instrument catalog.
///
/// Implementations must not keep mutable state between calls: every call is an
/// independent round trip and concurrent calls may return different snapshots.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<Stock>, CatalogProviderError>;
}
