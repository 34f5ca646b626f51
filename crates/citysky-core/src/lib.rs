pub mod config;
pub mod error;

pub use config::{
    Config, LocationConfig, LocationSource, StorageConfig, ValidationResult, WeatherConfig,
    ACCESS_KEY_ENV, API_URL_ENV, DEFAULT_CITIES,
};
pub use error::{AppError, ConfigError, LocationError, StorageError};

use anyhow::Result;

/// Initialize logging. Reads `RUST_LOG`, defaults to `info`, writes to stderr.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("CitySky core initialized");
    Ok(())
}
