//! View orchestration for CitySky
//!
//! The landing and details views own their state and drive the weather
//! client, cache and geolocator. A presentation layer reads view state and
//! subscribes to [`Notice`]s; nothing here renders or prints.

pub mod cities;
pub mod details;
pub mod landing;
pub mod notice;
pub mod route;
pub mod services;
pub mod state;

pub use cities::CityList;
pub use details::{DetailsView, NotesState};
pub use landing::{CityWeather, LandingMode, LandingView};
pub use notice::{Notice, Notifier, LOADING_MESSAGE};
pub use route::{Route, RouteError};
pub use services::{NetworkStatus, Origin, ViewServices, OFFLINE_NO_DATA};
pub use state::ViewState;
