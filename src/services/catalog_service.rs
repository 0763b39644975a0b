use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::external::catalog_provider::CatalogProvider;
use crate::models::Stock;
use crate::store::favorites::FavoritesStore;

// ==============================================================================
// Session Types
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogState {
    Idle,
    Fetching,
    Loaded,
    FetchFailed,
}

/// Catalog captured by one successful fetch. Not live-updating.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogSnapshot {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    pub stocks: Vec<Stock>,
}

/// Result of a fetch, pushed to subscribers. Each fetch yields at most one event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    Loaded { generation: u64, stocks: Vec<Stock> },
    Failed { generation: u64, error: String },
}

/// Catalog row with its favorite flag, serialized flat next to the stock fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedStock {
    #[serde(flatten)]
    pub stock: Stock,
    pub is_favorite: bool,
}

#[derive(Debug, Clone)]
pub struct CatalogServiceOptions {
    /// Surface favorites read failures instead of answering with an empty list.
    pub propagate_read_errors: bool,
    pub event_capacity: usize,
}

impl Default for CatalogServiceOptions {
    fn default() -> Self {
        Self {
            propagate_read_errors: false,
            event_capacity: 16,
        }
    }
}

struct Session {
    state: CatalogState,
    latest_generation: u64,
    snapshot: Option<CatalogSnapshot>,
}

// ==============================================================================
// Catalog Service
// ==============================================================================

/// Composes the catalog fetcher and the favorites store.
///
/// Overlapping fetches are resolved last-write-wins: every fetch takes a new
/// generation and only the most recently started one may update the session
/// or publish an event. Older fetches still hand their result to their caller.
pub struct CatalogService {
    provider: Arc<dyn CatalogProvider>,
    store: Arc<dyn FavoritesStore>,
    options: CatalogServiceOptions,
    session: RwLock<Session>,
    events: broadcast::Sender<CatalogEvent>,
    symbol_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl CatalogService {
    pub fn new(
        provider: Arc<dyn CatalogProvider>,
        store: Arc<dyn FavoritesStore>,
        options: CatalogServiceOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            provider,
            store,
            options,
            session: RwLock::new(Session {
                state: CatalogState::Idle,
                latest_generation: 0,
                snapshot: None,
            }),
            events,
            symbol_locks: DashMap::new(),
        }
    }

    /// Registers a listener for fetch results. Dropping the receiver unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.events.subscribe()
    }

    pub fn state(&self) -> CatalogState {
        self.session.read().state
    }

    pub fn snapshot(&self) -> Option<CatalogSnapshot> {
        self.session.read().snapshot.clone()
    }

    pub async fn fetch_catalog(&self) -> Result<Vec<Stock>, AppError> {
        let generation = {
            let mut session = self.session.write();
            session.latest_generation += 1;
            session.state = CatalogState::Fetching;
            session.latest_generation
        };

        info!("📡 Fetching catalog (generation {})", generation);
        let result = self.provider.fetch_catalog().await.map_err(AppError::from);

        let event = {
            let mut session = self.session.write();
            if session.latest_generation != generation {
                None
            } else {
                match &result {
                    Ok(stocks) => {
                        session.state = CatalogState::Loaded;
                        session.snapshot = Some(CatalogSnapshot {
                            generation,
                            fetched_at: Utc::now(),
                            stocks: stocks.clone(),
                        });
                        Some(CatalogEvent::Loaded {
                            generation,
                            stocks: stocks.clone(),
                        })
                    }
                    Err(e) => {
                        session.state = CatalogState::FetchFailed;
                        Some(CatalogEvent::Failed {
                            generation,
                            error: e.to_string(),
                        })
                    }
                }
            }
        };

        match event {
            // No subscribers is not an error.
            Some(event) => {
                let _ = self.events.send(event);
            }
            None => debug!("Discarding stale catalog result (generation {})", generation),
        }

        if let Err(e) = &result {
            error!("Catalog fetch failed: {}", e);
        }
        result
    }

    pub async fn list_favorites(&self) -> Result<Vec<Stock>, AppError> {
        match self.store.get_all().await {
            Ok(stocks) => Ok(stocks),
            Err(e) if self.options.propagate_read_errors => Err(e.into()),
            Err(e) => {
                warn!("Failed to read favorites, answering with none: {}", e);
                Ok(Vec::new())
            }
        }
    }

    pub async fn add_favorite(&self, stock: &Stock) -> Result<(), AppError> {
        let lease = self.symbol_lease(&stock.symbol);
        let _guard = lease.lock.lock().await;

        self.store.save(stock).await.map_err(|e| {
            error!("Failed to add favorite {}: {}", stock.symbol, e);
            AppError::from(e)
        })
    }

    pub async fn remove_favorite(&self, stock: &Stock) -> Result<(), AppError> {
        self.remove_favorite_by_symbol(&stock.symbol).await
    }

    pub async fn remove_favorite_by_symbol(&self, symbol: &str) -> Result<(), AppError> {
        let lease = self.symbol_lease(symbol);
        let _guard = lease.lock.lock().await;

        self.store.remove(symbol).await.map_err(|e| {
            error!("Failed to remove favorite {}: {}", symbol, e);
            AppError::from(e)
        })
    }

    pub async fn is_favorite(&self, symbol: &str) -> bool {
        self.store.contains(symbol).await
    }

    /// Marks each stock with its favorite status using a single favorites read.
    pub async fn annotate_favorites(&self, stocks: Vec<Stock>) -> Result<Vec<AnnotatedStock>, AppError> {
        let favorites: HashSet<String> = self
            .list_favorites()
            .await?
            .into_iter()
            .map(|s| s.symbol)
            .collect();

        Ok(stocks
            .into_iter()
            .map(|stock| AnnotatedStock {
                is_favorite: favorites.contains(&stock.symbol),
                stock,
            })
            .collect())
    }

    /// Searches the current snapshot, loading one first if none exists yet.
    pub async fn search_snapshot(&self, query: &str) -> Result<Vec<Stock>, AppError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = self.snapshot();
        match snapshot {
            Some(snapshot) => Ok(search(query, &snapshot.stocks)),
            None => {
                let stocks = self.fetch_catalog().await?;
                Ok(search(query, &stocks))
            }
        }
    }

    fn symbol_lease<'a>(&'a self, symbol: &'a str) -> SymbolLease<'a> {
        let lock = self
            .symbol_locks
            .entry(symbol.to_string())
            .or_default()
            .value()
            .clone();
        SymbolLease {
            locks: &self.symbol_locks,
            symbol,
            lock,
        }
    }
}

/// Shared handle on a per-symbol write lock. The map entry is dropped together
/// with the last lease, so client-supplied symbols never accumulate.
struct SymbolLease<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    symbol: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for SymbolLease<'_> {
    fn drop(&mut self) {
        // Release our handle inside the shard lock so concurrent leases of the
        // same symbol observe counts in order; the last one out removes the entry.
        let ours = std::mem::take(&mut self.lock);
        self.locks.remove_if(self.symbol, move |_, lock| {
            drop(ours);
            Arc::strong_count(lock) == 1
        });
    }
}

/// Case-insensitive substring match on symbol or name. An empty query matches nothing.
pub fn search(query: &str, stocks: &[Stock]) -> Vec<Stock> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    stocks
        .iter()
        .filter(|s| s.matches_lowercase(&needle))
        .cloned()
        .collect()
}
