use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            loki_enabled: lookup("LOKI_ENABLED")
                .unwrap_or_else(|| "false".to_string())
                .parse()
                .unwrap_or(false),
            loki_url: lookup("LOKI_URL"),
            service_name: lookup("SERVICE_NAME")
                .unwrap_or_else(|| "stock-catalog".to_string()),
            environment: lookup("ENVIRONMENT")
                .unwrap_or_else(|| "development".to_string()),
            log_level: lookup("RUST_LOG")
                .unwrap_or_else(|| "info".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err("LOKI_ENABLED is true but LOKI_URL is not set".to_string());
        }
        Ok(())
    }
}

/// Installs the global subscriber: env filter and fmt output, plus a Loki
/// layer when enabled and compiled in.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let filter = match tracing_subscriber::EnvFilter::try_new(&config.log_level) {
        Ok(filter) => filter,
        Err(e) => {
            eprintln!("Invalid RUST_LOG '{}' ({}), falling back to info", config.log_level, e);
            tracing_subscriber::EnvFilter::new("info")
        }
    };

    #[cfg(feature = "loki")]
    let loki_layer = match config.loki_url.as_deref().filter(|_| config.loki_enabled) {
        Some(loki_url) => Some(build_loki_layer(&config, loki_url)?),
        None => None,
    };
    #[cfg(not(feature = "loki"))]
    let loki_layer: Option<tracing_subscriber::layer::Identity> = None;

    let sink = if loki_layer.is_some() { "console + loki" } else { "console" };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(loki_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        "📊 Logging initialized ({})",
        sink
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn build_loki_layer(
    config: &LoggingConfig,
    loki_url: &str,
) -> Result<tracing_loki::Layer, Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered log lines to Loki
    tokio::spawn(task);

    Ok(layer)
}
