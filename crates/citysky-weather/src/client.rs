//! weatherstack `current` endpoint client.

use std::time::Duration;

use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::types::{ApiResponse, Coordinates, FetchError, FetchResult, WeatherRecord};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Endpoint and credentials. Either may be absent; lookups then fail
/// with [`FetchError::ConfigMissing`] without touching the network.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: Option<String>,
    pub access_key: Option<String>,
    pub timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: Option<String>, access_key: Option<String>) -> Self {
        Self {
            base_url,
            access_key,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&citysky_core::WeatherConfig> for ClientSettings {
    fn from(config: &citysky_core::WeatherConfig) -> Self {
        Self::new(config.api_url.clone(), config.access_key.clone())
            .with_timeout(Duration::from_secs(config.timeout_secs))
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    base_url: Option<String>,
    access_key: Option<String>,
}

impl WeatherClient {
    pub fn new(settings: ClientSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self {
            client,
            base_url: non_empty(settings.base_url),
            access_key: non_empty(settings.access_key),
        })
    }

    /// True when both the endpoint and the access key are set.
    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.access_key.is_some()
    }

    /// Current weather for a free-text city name.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_city(&self, city: &str) -> FetchResult<WeatherRecord> {
        self.fetch(city).await
    }

    /// Current weather at a coordinate pair, queried as `"<lat>,<lon>"`.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_by_coordinates(&self, coords: Coordinates) -> FetchResult<WeatherRecord> {
        self.fetch(&coords.to_string()).await
    }

    async fn fetch(&self, query: &str) -> FetchResult<WeatherRecord> {
        let (base_url, access_key) = match (&self.base_url, &self.access_key) {
            (Some(url), Some(key)) => (url, key),
            _ => {
                tracing::warn!("Weather API URL or access key not configured");
                return Err(FetchError::ConfigMissing);
            }
        };

        let url = Url::parse_with_params(
            base_url,
            &[("access_key", access_key.as_str()), ("query", query)],
        )
        .map_err(|e| {
            tracing::warn!("Invalid weather API URL: {}", e);
            FetchError::Unknown
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("Weather API returned status {}", status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let body: ApiResponse = response.json().await.map_err(classify_transport_error)?;
        body.into_record()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn classify_transport_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() || error.is_connect() {
        tracing::debug!("Weather API unreachable: {}", error);
        FetchError::Unreachable
    } else {
        tracing::debug!("Weather request failed: {}", error);
        FetchError::Unknown
    }
}
