//! Shared services handed to every view: weather client, cache,
//! geolocation, connectivity and the notice channel.

use std::future::Future;
use std::sync::Arc;

use citysky_core::{AppError, Config};
use citysky_weather::{
    Cache, CacheKey, ClientSettings, Coordinates, FetchResult, Geolocator, WeatherClient,
    WeatherRecord,
};
use tokio_util::sync::CancellationToken;

use crate::notice::Notifier;

pub const OFFLINE_NO_DATA: &str = "No internet connection and no weather data available.";

/// Connectivity as the presentation layer reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkStatus {
    #[default]
    Online,
    Offline,
}

/// Where a displayed record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Network,
    Cache,
}

#[derive(Debug, Clone)]
pub struct ViewServices {
    pub client: Arc<WeatherClient>,
    pub cache: Cache,
    pub geolocator: Arc<Geolocator>,
    pub network: NetworkStatus,
    pub notifier: Notifier,
}

impl ViewServices {
    pub fn new(client: WeatherClient, cache: Cache, geolocator: Geolocator) -> Self {
        Self {
            client: Arc::new(client),
            cache,
            geolocator: Arc::new(geolocator),
            network: NetworkStatus::Online,
            notifier: Notifier::silent(),
        }
    }

    /// Build the client and geolocator from configuration.
    pub fn from_config(config: &Config, cache: Cache) -> Result<Self, AppError> {
        let settings = ClientSettings::from(&config.weather);
        let timeout = settings.timeout;
        let client = WeatherClient::new(settings)
            .map_err(|e| AppError::Other(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;
        let geolocator = Geolocator::from_config(&config.location, timeout)?;

        if !client.is_configured() {
            tracing::warn!("Weather API is not configured; lookups will fail");
        }

        Ok(Self::new(client, cache, geolocator))
    }

    pub fn with_network(mut self, network: NetworkStatus) -> Self {
        self.network = network;
        self
    }

    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Fetch one city, writing `weather-<city>` on success and falling back
    /// to it when offline. `None` if `cancel` fired first.
    pub(crate) async fn fetch_city(
        &self,
        cancel: &CancellationToken,
        city: &str,
    ) -> Option<Result<(WeatherRecord, Origin), String>> {
        self.fetch_or_cached(cancel, CacheKey::weather(city), self.client.fetch_by_city(city))
            .await
    }

    /// Same as [`ViewServices::fetch_city`] for a coordinate pair, keyed
    /// `weather-<lat>,<lon>`.
    pub(crate) async fn fetch_at(
        &self,
        cancel: &CancellationToken,
        coords: Coordinates,
    ) -> Option<Result<(WeatherRecord, Origin), String>> {
        self.fetch_or_cached(
            cancel,
            CacheKey::WeatherAt(coords),
            self.client.fetch_by_coordinates(coords),
        )
        .await
    }

    pub(crate) fn is_offline(&self) -> bool {
        self.network == NetworkStatus::Offline
    }

    /// `fetch` is only polled when online, so offline runs issue no request.
    async fn fetch_or_cached<F>(
        &self,
        cancel: &CancellationToken,
        key: CacheKey,
        fetch: F,
    ) -> Option<Result<(WeatherRecord, Origin), String>>
    where
        F: Future<Output = FetchResult<WeatherRecord>>,
    {
        if self.is_offline() {
            tracing::info!("Offline; reading {} from cache", key);
            return Some(self.cached(&key));
        }

        match until_cancelled(cancel, fetch).await? {
            Ok(record) => {
                if let Err(e) = self.cache.put(&key, &record) {
                    tracing::warn!("Failed to cache {}: {}", key, e);
                }
                Some(Ok((record, Origin::Network)))
            }
            Err(e) if e.is_offline() => {
                tracing::info!("Weather API unreachable; reading {} from cache", key);
                Some(self.cached(&key))
            }
            Err(e) => Some(Err(e.to_string())),
        }
    }

    fn cached(&self, key: &CacheKey) -> Result<(WeatherRecord, Origin), String> {
        self.cache
            .get::<WeatherRecord>(key)
            .map(|record| (record, Origin::Cache))
            .ok_or_else(|| OFFLINE_NO_DATA.to_string())
    }
}

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn until_cancelled<F: Future>(
    cancel: &CancellationToken,
    fut: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::debug!("View closed; dropping in-flight request");
            None
        }
        out = fut => Some(out),
    }
}
