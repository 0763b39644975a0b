use std::sync::Arc;

use anyhow::{anyhow, Context};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use stock_catalog_backend::app;
use stock_catalog_backend::config::{AppConfig, FavoritesBackend};
use stock_catalog_backend::external::catalog_provider::CatalogProvider;
use stock_catalog_backend::external::http_catalog::{HttpCatalogProvider, RetryPolicy};
use stock_catalog_backend::logging;
use stock_catalog_backend::services::catalog_service::{CatalogService, CatalogServiceOptions};
use stock_catalog_backend::state::AppState;
use stock_catalog_backend::store::favorites::{FavoritesStore, InMemoryFavoritesStore, PgFavoritesStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env().map_err(|e| anyhow!(e))?;

    // Initialize logging FIRST
    logging::init_logging(config.logging.clone())
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))?;

    let provider: Arc<dyn CatalogProvider> = Arc::new(
        HttpCatalogProvider::new(
            &config.catalog_url,
            config.fetch_timeout,
            RetryPolicy {
                max_retries: config.fetch_max_retries,
                base_delay: config.fetch_retry_base,
            },
        )
        .context("failed to create catalog provider (check CATALOG_URL)")?,
    );
    tracing::info!("📡 Catalog source: {}", config.catalog_url);

    let store: Arc<dyn FavoritesStore> = match config.favorites_backend {
        FavoritesBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres favorites backend")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await
                .context("failed to connect to DATABASE_URL")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("failed to run migrations")?;
            tracing::info!("⭐ Favorites backend: Postgres");
            Arc::new(PgFavoritesStore::new(pool))
        }
        FavoritesBackend::Memory => {
            tracing::warn!("⭐ Favorites backend: in-memory (favorites are lost on restart)");
            Arc::new(InMemoryFavoritesStore::new())
        }
    };

    let catalog = CatalogService::new(
        provider,
        store,
        CatalogServiceOptions {
            propagate_read_errors: config.propagate_read_errors,
            ..CatalogServiceOptions::default()
        },
    );
    let state = AppState {
        catalog: Arc::new(catalog),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Stock catalog backend running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
