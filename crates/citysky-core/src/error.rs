//! Centralized error types for CitySky.
//!
//! Weather lookups themselves never fail with these: the weather client
//! reports failures as data (`citysky_weather::FetchError`). These types
//! cover setup and local resources: configuration, the cache file, and
//! the geolocation provider.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a message fit for the terminal.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Invalid route: {0}")]
    Route(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Storage(e) => e.user_message(),
            AppError::Location(e) => e.user_message(),
            AppError::Route(_) => "That page does not exist.",
            AppError::Other(_) => "An unexpected error occurred. Please try again.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}

/// Local key-value cache errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Cache open failed: {0}")]
    OpenFailed(String),

    #[error("Cache query failed: {0}")]
    QueryFailed(String),

    #[error("Cache value could not be encoded: {0}")]
    Encode(String),
}

impl StorageError {
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::OpenFailed(_) => "Unable to open the local cache. Check the storage path.",
            StorageError::QueryFailed(_) => "A cache operation failed. Please try again.",
            StorageError::Encode(_) => "Could not save data to the local cache.",
        }
    }
}

/// Geolocation provider errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Geolocation is not supported on this platform")]
    Unsupported,

    #[error("Location service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "Location access was denied.",
            LocationError::Unsupported => "Geolocation is not supported by this platform.",
            LocationError::ServiceUnavailable(_) => {
                "Unable to determine your location. Please try again."
            }
        }
    }
}
