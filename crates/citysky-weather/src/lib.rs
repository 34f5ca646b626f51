//! Weather data for CitySky
//!
//! Provides the weatherstack client, the key-value cache used for offline
//! viewing and notes, and geolocation providers.

pub mod cache;
pub mod client;
pub mod location;
pub mod types;

pub use cache::{Cache, CacheKey, KvStore, MemoryStore, SqliteStore, StoredValue};
pub use client::{ClientSettings, WeatherClient};
pub use location::{Geolocator, IpLocator};
pub use types::*;
