use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use crate::db::favorite_queries;
use crate::models::Stock;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable favorites keyed by symbol.
///
/// At most one entry exists per symbol; `save` is the guard that keeps it that
/// way. `contains` never fails: a read error counts as "not a favorite".
#[async_trait]
pub trait FavoritesStore: Send + Sync {
    async fn save(&self, stock: &Stock) -> Result<(), StoreError>;

    /// All entries. Order is whatever the backend yields and carries no meaning.
    async fn get_all(&self) -> Result<Vec<Stock>, StoreError>;

    async fn remove(&self, symbol: &str) -> Result<(), StoreError>;

    async fn contains(&self, symbol: &str) -> bool;
}

// ==============================================================================
// Postgres
// ==============================================================================

pub struct PgFavoritesStore {
    pool: PgPool,
}

impl PgFavoritesStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoritesStore for PgFavoritesStore {
    async fn save(&self, stock: &Stock) -> Result<(), StoreError> {
        let inserted = favorite_queries::insert_if_absent(&self.pool, stock).await?;
        if inserted {
            info!("⭐ Saved favorite {}", stock.symbol);
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Stock>, StoreError> {
        let rows = favorite_queries::fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Stock::from).collect())
    }

    async fn remove(&self, symbol: &str) -> Result<(), StoreError> {
        let removed = favorite_queries::delete_by_symbol(&self.pool, symbol).await?;
        if removed > 0 {
            info!("🗑 Removed favorite {}", symbol);
        }
        Ok(())
    }

    async fn contains(&self, symbol: &str) -> bool {
        match favorite_queries::exists(&self.pool, symbol).await {
            Ok(found) => found,
            Err(e) => {
                warn!("Failed to check favorite {}: {}", symbol, e);
                false
            }
        }
    }
}

// ==============================================================================
// In-memory
// ==============================================================================

/// Process-local store used when no database is configured, and in tests.
#[derive(Default)]
pub struct InMemoryFavoritesStore {
    entries: RwLock<Vec<Stock>>,
}

impl InMemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoritesStore for InMemoryFavoritesStore {
    async fn save(&self, stock: &Stock) -> Result<(), StoreError> {
        let mut entries = self.entries.write();
        if !entries.iter().any(|s| s.symbol == stock.symbol) {
            entries.push(stock.clone());
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<Stock>, StoreError> {
        Ok(self.entries.read().clone())
    }

    async fn remove(&self, symbol: &str) -> Result<(), StoreError> {
        self.entries.write().retain(|s| s.symbol != symbol);
        Ok(())
    }

    async fn contains(&self, symbol: &str) -> bool {
        self.entries.read().iter().any(|s| s.symbol == symbol)
    }
}
