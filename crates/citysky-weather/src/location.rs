//! One-shot "where am I" lookups.

use std::time::Duration;

use citysky_core::{LocationConfig, LocationError, LocationSource};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::types::Coordinates;

const USER_AGENT: &str = concat!("citysky/", env!("CARGO_PKG_VERSION"));

/// Source of the device position.
#[derive(Debug, Clone)]
pub enum Geolocator {
    /// The platform has no geolocation
    Unavailable,
    /// Fixed coordinates from configuration
    Fixed(Coordinates),
    /// Approximate position from an IP geolocation service
    IpLookup(IpLocator),
}

impl Geolocator {
    pub fn from_config(config: &LocationConfig, timeout: Duration) -> Result<Self, LocationError> {
        match config.source {
            LocationSource::None => Ok(Self::Unavailable),
            LocationSource::Fixed => match (config.latitude, config.longitude) {
                (Some(lat), Some(lon)) => Ok(Self::Fixed(Coordinates::new(lat, lon))),
                _ => Err(LocationError::ServiceUnavailable(
                    "fixed location needs latitude and longitude".to_string(),
                )),
            },
            LocationSource::Ip => Ok(Self::IpLookup(IpLocator::new(
                &config.ip_lookup_url,
                timeout,
            )?)),
        }
    }

    /// Whether resolving the position goes over the network.
    pub fn needs_network(&self) -> bool {
        matches!(self, Self::IpLookup(_))
    }

    /// Resolve the current position.
    pub async fn current_position(&self) -> Result<Coordinates, LocationError> {
        match self {
            Self::Unavailable => Err(LocationError::Unsupported),
            Self::Fixed(coords) => Ok(*coords),
            Self::IpLookup(locator) => locator.locate().await,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

/// Client for ip-api.com style JSON services (`{status, lat, lon, city}`).
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: Client,
    url: String,
}

impl IpLocator {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, LocationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LocationError::ServiceUnavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub async fn locate(&self) -> Result<Coordinates, LocationError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| LocationError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            return Err(LocationError::PermissionDenied);
        }
        if !status.is_success() {
            return Err(LocationError::ServiceUnavailable(format!(
                "lookup returned status {}",
                status
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::ServiceUnavailable(e.to_string()))?;

        if body.status.as_deref().is_some_and(|s| s != "success") {
            return Err(LocationError::ServiceUnavailable(
                body.message.unwrap_or_else(|| "lookup failed".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                tracing::info!(
                    "Located near {}",
                    body.city.as_deref().unwrap_or("unknown city")
                );
                Ok(Coordinates::new(lat, lon))
            }
            _ => Err(LocationError::ServiceUnavailable(
                "lookup response had no coordinates".to_string(),
            )),
        }
    }
}
