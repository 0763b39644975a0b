use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==============================================================================
// Stock Models
// ==============================================================================

/// One instrument as published by the upstream catalog.
///
/// The JSON field names are part of the upstream contract, so `change_percent`
/// travels as `changePercent`. `symbol` is the business key: favorites,
/// search and dedup all go through it, never through `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub logo: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    #[serde(rename = "changePercent")]
    pub change_percent: f64,
}

impl Stock {
    /// Decodes a whole catalog payload. Any bad record fails the entire payload.
    pub fn decode_catalog(payload: &[u8]) -> Result<Vec<Stock>, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    pub fn encode_catalog(stocks: &[Stock]) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(stocks)
    }

    /// Substring match against symbol or name, ignoring the stock's case.
    /// `needle` must already be lowercase; `catalog_service::search` takes care of it.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.symbol.to_lowercase().contains(needle) || self.name.to_lowercase().contains(needle)
    }
}

// ==============================================================================
// Favorite Models
// ==============================================================================

/// Persisted favorite row. Same shape as `Stock` plus storage bookkeeping.
#[derive(Debug, Clone, FromRow)]
pub struct FavoriteStock {
    pub row_id: i64,
    pub id: i64,
    pub logo: String,
    pub name: String,
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub created_at: DateTime<Utc>,
}

impl From<FavoriteStock> for Stock {
    fn from(row: FavoriteStock) -> Self {
        Self {
            id: row.id,
            logo: row.logo,
            name: row.name,
            symbol: row.symbol,
            price: row.price,
            change: row.change,
            change_percent: row.change_percent,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteStatusResponse {
    pub symbol: String,
    pub is_favorite: bool,
}

// ==============================================================================
// Query Parameters
// ==============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}
