use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::logging::LoggingConfig;

pub const DEFAULT_CATALOG_URL: &str = "https://api.webdmitriev.com/wp-json/wp/v2/stock-posts";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesBackend {
    Postgres,
    Memory,
}

impl FromStr for FavoritesBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(FavoritesBackend::Postgres),
            "memory" | "in-memory" => Ok(FavoritesBackend::Memory),
            _ => Err(format!(
                "Invalid FAVORITES_BACKEND: {}. Must be 'postgres' or 'memory'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub catalog_url: String,
    pub bind_addr: SocketAddr,
    pub favorites_backend: FavoritesBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub fetch_timeout: Duration,
    pub fetch_max_retries: u32,
    pub fetch_retry_base: Duration,
    pub propagate_read_errors: bool,
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup, so tests don't have to touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").filter(|v| !v.is_empty());

        let favorites_backend = match lookup("FAVORITES_BACKEND") {
            Some(name) => name.parse::<FavoritesBackend>()?,
            None if database_url.is_some() => FavoritesBackend::Postgres,
            None => FavoritesBackend::Memory,
        };

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| format!("Invalid BIND_ADDR: {}", e))?;

        let config = Self {
            catalog_url: lookup("CATALOG_URL").unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string()),
            bind_addr,
            favorites_backend,
            database_url,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            fetch_timeout: Duration::from_secs(parse_or(&lookup, "FETCH_TIMEOUT_SECS", 10)?),
            fetch_max_retries: parse_or(&lookup, "FETCH_MAX_RETRIES", 2)?,
            fetch_retry_base: Duration::from_millis(parse_or(&lookup, "FETCH_RETRY_BASE_MS", 250)?),
            propagate_read_errors: parse_or(&lookup, "PROPAGATE_READ_ERRORS", false)?,
            logging: LoggingConfig::from_lookup(&lookup),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        url::Url::parse(&self.catalog_url)
            .map_err(|e| format!("Invalid CATALOG_URL {}: {}", self.catalog_url, e))?;

        if self.favorites_backend == FavoritesBackend::Postgres && self.database_url.is_none() {
            return Err("FAVORITES_BACKEND is postgres but DATABASE_URL is not set".to_string());
        }
        if self.fetch_timeout.is_zero() {
            return Err("FETCH_TIMEOUT_SECS must be greater than zero".to_string());
        }

        self.logging.validate()
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| format!("Invalid {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}
