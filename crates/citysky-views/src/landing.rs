//! Landing view: the largest-cities grid, city search and current location.

use citysky_weather::{CacheKey, WeatherRecord};
use futures::future::join_all;
use tokio_util::sync::CancellationToken;

use crate::cities::CityList;
use crate::route::Route;
use crate::services::{until_cancelled, Origin, ViewServices, OFFLINE_NO_DATA};
use crate::state::ViewState;

/// Which panel the landing view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LandingMode {
    #[default]
    LargestCities,
    CurrentLocation,
}

/// A grid entry: the list entry it was fetched for and the record.
#[derive(Debug, Clone, PartialEq)]
pub struct CityWeather {
    pub city: String,
    pub record: WeatherRecord,
}

impl CityWeather {
    fn matches(&self, name: &str) -> bool {
        let name = name.trim();
        self.city.eq_ignore_ascii_case(name)
            || self
                .record
                .location
                .name()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
    }
}

pub struct LandingView {
    services: ViewServices,
    cancel: CancellationToken,
    defaults: Vec<String>,
    cities: CityList,
    mode: LandingMode,
    grid: ViewState<Vec<CityWeather>>,
    searched: ViewState<WeatherRecord>,
    current_location: ViewState<WeatherRecord>,
    search_term: String,
}

impl LandingView {
    /// Open the view with the persisted city list, or `defaults` if none.
    pub fn new(services: ViewServices, defaults: Vec<String>) -> Self {
        let cities = CityList::load(&services.cache, &defaults);
        Self {
            services,
            cancel: CancellationToken::new(),
            defaults,
            cities,
            mode: LandingMode::default(),
            grid: ViewState::default(),
            searched: ViewState::default(),
            current_location: ViewState::default(),
            search_term: String::new(),
        }
    }

    pub fn cities(&self) -> &CityList {
        &self.cities
    }

    pub fn mode(&self) -> LandingMode {
        self.mode
    }

    /// Grid entries, sorted by location name.
    pub fn grid(&self) -> &ViewState<Vec<CityWeather>> {
        &self.grid
    }

    pub fn searched(&self) -> &ViewState<WeatherRecord> {
        &self.searched
    }

    pub fn current_location(&self) -> &ViewState<WeatherRecord> {
        &self.current_location
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Token that closes the view; in-flight loads are abandoned once it fires.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Fetch every city in the list concurrently. Failed cities are left
    /// out of the grid; the batch only errors when every city failed.
    /// Offline, the grid is built from cached `weather-<city>` entries.
    pub async fn load_cities(&mut self) {
        self.grid.begin();
        self.services.notifier.loading();

        if self.services.is_offline() {
            self.load_cached_cities();
            return;
        }

        let client = &self.services.client;
        let fetches = self.cities.iter().map(move |city| async move {
            let result = client.fetch_by_city(city).await;
            (city.to_string(), result)
        });

        let Some(results) = until_cancelled(&self.cancel, join_all(fetches)).await else {
            self.grid.reset();
            return;
        };

        let attempted = results.len();
        let mut first_error = None;
        let mut entries = Vec::with_capacity(attempted);
        for (city, result) in results {
            match result {
                Ok(record) => {
                    let key = CacheKey::weather(city.as_str());
                    if let Err(e) = self.services.cache.put(&key, &record) {
                        tracing::warn!("Failed to cache {}: {}", key, e);
                    }
                    entries.push(CityWeather { city, record });
                }
                Err(e) => {
                    tracing::debug!(city = %city, error = %e, "Dropping city from grid");
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        tracing::info!("Loaded {} of {} cities", entries.len(), attempted);

        match first_error {
            Some(message) if entries.is_empty() => {
                self.services.notifier.error(message.as_str());
                self.grid.settle(Err(message));
            }
            _ => {
                sort_by_location_name(&mut entries);
                self.services
                    .notifier
                    .success("Weather data loaded successfully.");
                self.grid.settle(Ok(entries));
            }
        }
    }

    fn load_cached_cities(&mut self) {
        let cache = &self.services.cache;
        let mut entries: Vec<CityWeather> = self
            .cities
            .iter()
            .filter_map(|city| {
                cache
                    .get::<WeatherRecord>(&CacheKey::weather(city))
                    .map(|record| CityWeather {
                        city: city.to_string(),
                        record,
                    })
            })
            .collect();

        tracing::info!(
            "Offline; {} of {} cities found in cache",
            entries.len(),
            self.cities.len()
        );

        if entries.is_empty() && !self.cities.is_empty() {
            self.services.notifier.error(OFFLINE_NO_DATA);
            self.grid.settle(Err(OFFLINE_NO_DATA.to_string()));
            return;
        }

        sort_by_location_name(&mut entries);
        self.services
            .notifier
            .success("Loaded weather data from cache.");
        self.grid.settle(Ok(entries));
    }

    /// Look up the current search term. Blank terms are ignored.
    pub async fn search(&mut self) {
        let term = self.search_term.trim().to_string();
        if term.is_empty() {
            return;
        }

        self.searched.begin();
        self.services.notifier.loading();

        let Some(outcome) = self.services.fetch_city(&self.cancel, &term).await else {
            self.searched.reset();
            return;
        };

        match outcome {
            Ok((record, origin)) => {
                let message = match origin {
                    Origin::Network => format!("Weather data for {} loaded.", record.name()),
                    Origin::Cache => format!("Loaded weather data for {} from cache.", term),
                };
                self.services.notifier.success(message);
                self.search_term.clear();
                self.searched.settle(Ok(record));
            }
            Err(message) => {
                self.services.notifier.error(message.as_str());
                self.searched.settle(Err(message));
            }
        }
    }

    /// Weather at the device position. Denied or missing geolocation is
    /// reported as an error; it never falls back to the city grid.
    pub async fn locate(&mut self) {
        self.current_location.begin();
        self.services.notifier.loading();

        let geolocator = self.services.geolocator.clone();
        if self.services.is_offline() && geolocator.needs_network() {
            tracing::info!("Offline; cannot look up the device position");
            self.services.notifier.error(OFFLINE_NO_DATA);
            self.current_location.settle(Err(OFFLINE_NO_DATA.to_string()));
            return;
        }

        let Some(position) = until_cancelled(&self.cancel, geolocator.current_position()).await
        else {
            self.current_location.reset();
            return;
        };

        let coords = match position {
            Ok(coords) => coords,
            Err(e) => {
                let message = e.user_message().to_string();
                tracing::info!("Geolocation failed: {}", e);
                self.services.notifier.error(message.as_str());
                self.current_location.settle(Err(message));
                return;
            }
        };

        let Some(outcome) = self.services.fetch_at(&self.cancel, coords).await else {
            self.current_location.reset();
            return;
        };

        match outcome {
            Ok((record, origin)) => {
                let message = match origin {
                    Origin::Network => {
                        format!("Weather data for your location: {} loaded.", record.name())
                    }
                    Origin::Cache => "Loaded weather data for your location from cache.".to_string(),
                };
                self.services.notifier.success(message);
                self.current_location.settle(Ok(record));
            }
            Err(message) => {
                self.services.notifier.error(message.as_str());
                self.current_location.settle(Err(message));
            }
        }
    }

    /// Switch to the city grid: clears any search result and reloads.
    pub async fn show_largest_cities(&mut self) {
        self.mode = LandingMode::LargestCities;
        self.search_term.clear();
        self.searched.reset();
        self.load_cities().await;
    }

    /// Switch to the current-location panel and locate.
    pub async fn show_current_location(&mut self) {
        self.mode = LandingMode::CurrentLocation;
        self.locate().await;
    }

    /// Drop a city from the list and the grid, and persist the list.
    /// `name` may be the list entry or the location name the API returned.
    pub fn remove_city(&mut self, name: &str) -> bool {
        let mut removed = self.cities.remove(name);

        if let Some(entries) = self.grid.data_mut() {
            let before = entries.len();
            let mut dropped = Vec::new();
            entries.retain(|entry| {
                let matched = entry.matches(name);
                if matched {
                    dropped.push(entry.city.clone());
                }
                !matched
            });
            for city in dropped {
                removed |= self.cities.remove(&city);
            }
            removed |= entries.len() != before;
        }

        if removed {
            if let Err(e) = self.cities.save(&self.services.cache) {
                tracing::warn!("Failed to persist city list: {}", e);
            }
        }
        removed
    }

    /// Restore the default city list and forget the persisted one.
    pub fn reset_cities(&mut self) {
        self.cities = CityList::new(&self.defaults);
        if let Err(e) = CityList::clear_saved(&self.services.cache) {
            tracing::warn!("Failed to clear persisted city list: {}", e);
        }
    }

    /// Route to a city's details page.
    pub fn open_city(&self, name: &str) -> Option<Route> {
        Route::city(name)
    }
}

impl Drop for LandingView {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

fn sort_by_location_name(entries: &mut [CityWeather]) {
    entries.sort_by_cached_key(|entry| {
        let name = entry.record.location.name().unwrap_or_default().to_string();
        (name.to_lowercase(), name)
    });
}
