//! Landing view flows against a mock weatherstack server.

use std::time::Duration;

use citysky_views::{LandingMode, LandingView, NetworkStatus, Notice, Notifier, ViewServices};
use citysky_weather::{
    Cache, CacheKey, ClientSettings, Coordinates, Geolocator, IpLocator, WeatherClient,
    WeatherRecord,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn weather_body(name: &str, temperature: i64) -> serde_json::Value {
    serde_json::json!({
        "request": { "type": "City", "query": name },
        "location": { "name": name, "country": "Somewhere" },
        "current": {
            "temperature": temperature,
            "weather_descriptions": ["Partly cloudy"]
        }
    })
}

async fn mount_city(server: &MockServer, query: &str, name: &str) {
    Mock::given(method("GET"))
        .and(path("/current"))
        .and(query_param("query", query))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body(name, 20)))
        .mount(server)
        .await;
}

fn client_for(base: &str) -> WeatherClient {
    WeatherClient::new(ClientSettings::new(
        Some(format!("{}/current", base)),
        Some("test_api_key".to_string()),
    ))
    .unwrap()
}

fn services(base: &str, cache: Cache, geolocator: Geolocator) -> ViewServices {
    ViewServices::new(client_for(base), cache, geolocator)
}

/// Base URL of a local port with no listener.
fn closed_port_base() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn cities(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn grid_names(view: &LandingView) -> Vec<String> {
    view.grid()
        .data()
        .unwrap()
        .iter()
        .map(|entry| entry.record.name().to_string())
        .collect()
}

#[tokio::test]
async fn test_bulk_fetch_drops_failures_and_sorts() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "Tokyo", "Tokyo").await;
    mount_city(&mock_server, "Cairo", "Cairo").await;
    mount_city(&mock_server, "Berlin", "Berlin").await;
    // "Atlantis" matches no mock and gets a 404

    let cache = Cache::in_memory();
    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Unavailable)
            .with_notifier(notifier),
        cities(&["Tokyo", "Cairo", "Atlantis", "Berlin"]),
    );

    view.load_cities().await;

    assert_eq!(grid_names(&view), vec!["Berlin", "Cairo", "Tokyo"]);
    assert!(cache.get::<WeatherRecord>(&CacheKey::weather("Tokyo")).is_some());
    assert!(cache.get::<WeatherRecord>(&CacheKey::weather("Atlantis")).is_none());

    assert!(matches!(rx.try_recv().unwrap(), Notice::Loading(_)));
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Weather data loaded successfully.".into())
    );
}

#[tokio::test]
async fn test_bulk_fetch_all_failing_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut view = LandingView::new(
        services(&mock_server.uri(), Cache::in_memory(), Geolocator::Unavailable),
        cities(&["Tokyo", "Cairo"]),
    );

    view.load_cities().await;

    assert_eq!(
        view.grid().error(),
        Some("Network response was not ok. Status: 500")
    );
}

#[tokio::test]
async fn test_remove_city_persists_and_reset_restores() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "Delhi", "New Delhi").await;
    mount_city(&mock_server, "Cairo", "Cairo").await;

    let cache = Cache::in_memory();
    let defaults = cities(&["Delhi", "Cairo"]);
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Unavailable),
        defaults.clone(),
    );
    view.load_cities().await;

    // The grid shows the API's name; removal by it drops the list entry too
    assert!(view.remove_city("New Delhi"));
    assert_eq!(grid_names(&view), vec!["Cairo"]);
    assert!(!view.cities().contains("Delhi"));
    assert!(!view.remove_city("Delhi"));

    let reopened = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Unavailable),
        defaults.clone(),
    );
    assert_eq!(reopened.cities().iter().collect::<Vec<_>>(), vec!["Cairo"]);
    drop(reopened);

    view.reset_cities();
    assert_eq!(view.cities().len(), 2);
    let reopened = LandingView::new(
        services(&mock_server.uri(), cache, Geolocator::Unavailable),
        defaults,
    );
    assert!(reopened.cities().contains("Delhi"));
}

#[tokio::test]
async fn test_search_stores_result_and_clears_term() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .and(query_param("access_key", "test_api_key"))
        .and(query_param("query", "Test City"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Test City", 25)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let cache = Cache::in_memory();
    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Unavailable)
            .with_notifier(notifier),
        Vec::new(),
    );

    view.set_search_term("  Test City ");
    view.search().await;

    let record = view.searched().data().unwrap();
    assert_eq!(record.name(), "Test City");
    assert_eq!(record.current.temperature(), Some(25.0));
    assert_eq!(view.search_term(), "");
    assert!(cache.get::<WeatherRecord>(&CacheKey::weather("Test City")).is_some());

    rx.try_recv().unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Weather data for Test City loaded.".into())
    );
}

#[tokio::test]
async fn test_blank_search_is_ignored() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut view = LandingView::new(
        services(&mock_server.uri(), Cache::in_memory(), Geolocator::Unavailable),
        Vec::new(),
    );
    view.set_search_term("   ");
    view.search().await;

    assert!(view.searched().is_idle());
}

#[tokio::test]
async fn test_unreachable_api_falls_back_to_cache() {
    let cache = Cache::in_memory();
    cache
        .put(
            &CacheKey::weather("Paris"),
            &serde_json::from_value::<WeatherRecord>(weather_body("Paris", 12)).unwrap(),
        )
        .unwrap();

    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&closed_port_base(), cache, Geolocator::Unavailable).with_notifier(notifier),
        Vec::new(),
    );

    view.set_search_term("Paris");
    view.search().await;
    assert_eq!(view.searched().data().unwrap().name(), "Paris");

    rx.try_recv().unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Loaded weather data for Paris from cache.".into())
    );

    view.set_search_term("Lyon");
    view.search().await;
    assert_eq!(
        view.searched().error(),
        Some("No internet connection and no weather data available.")
    );
}

#[tokio::test]
async fn test_offline_status_reads_cache_without_requests() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Paris", 30)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cache = Cache::in_memory();
    cache
        .put(
            &CacheKey::weather("Paris"),
            &serde_json::from_value::<WeatherRecord>(weather_body("Paris", 12)).unwrap(),
        )
        .unwrap();

    let mut view = LandingView::new(
        services(&mock_server.uri(), cache, Geolocator::Unavailable)
            .with_network(NetworkStatus::Offline),
        Vec::new(),
    );
    view.set_search_term("Paris");
    view.search().await;

    assert_eq!(
        view.searched().data().unwrap().current.temperature(),
        Some(12.0)
    );
}

#[tokio::test]
async fn test_offline_bulk_load_builds_grid_from_cache() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Tokyo", 30)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let cache = Cache::in_memory();
    cache
        .put(
            &CacheKey::weather("Tokyo"),
            &serde_json::from_value::<WeatherRecord>(weather_body("Tokyo", 21)).unwrap(),
        )
        .unwrap();

    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache, Geolocator::Unavailable)
            .with_network(NetworkStatus::Offline)
            .with_notifier(notifier),
        cities(&["Tokyo", "Cairo"]),
    );

    view.load_cities().await;

    assert_eq!(grid_names(&view), vec!["Tokyo"]);
    assert!(matches!(rx.try_recv().unwrap(), Notice::Loading(_)));
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Loaded weather data from cache.".into())
    );
}

#[tokio::test]
async fn test_offline_bulk_load_without_cache_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Tokyo", 30)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut view = LandingView::new(
        services(&mock_server.uri(), Cache::in_memory(), Geolocator::Unavailable)
            .with_network(NetworkStatus::Offline),
        cities(&["Tokyo", "Cairo"]),
    );

    view.load_cities().await;

    assert_eq!(
        view.grid().error(),
        Some("No internet connection and no weather data available.")
    );
}

#[tokio::test]
async fn test_offline_locate_reads_cached_position_weather() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Paris", 30)))
        .expect(0)
        .mount(&mock_server)
        .await;

    let coords = Coordinates::new(48.85, 2.35);
    let cache = Cache::in_memory();
    cache
        .put(
            &CacheKey::WeatherAt(coords),
            &serde_json::from_value::<WeatherRecord>(weather_body("Paris", 16)).unwrap(),
        )
        .unwrap();

    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache, Geolocator::Fixed(coords))
            .with_network(NetworkStatus::Offline)
            .with_notifier(notifier),
        Vec::new(),
    );

    view.locate().await;

    assert_eq!(
        view.current_location().data().unwrap().current.temperature(),
        Some(16.0)
    );
    rx.try_recv().unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Loaded weather data for your location from cache.".into())
    );
}

#[tokio::test]
async fn test_offline_ip_lookup_is_not_attempted() {
    let lookup_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success", "lat": 48.85, "lon": 2.35
        })))
        .expect(0)
        .mount(&lookup_server)
        .await;

    let locator = IpLocator::new(&lookup_server.uri(), Duration::from_secs(5)).unwrap();
    let mut view = LandingView::new(
        services(
            &closed_port_base(),
            Cache::in_memory(),
            Geolocator::IpLookup(locator),
        )
        .with_network(NetworkStatus::Offline),
        Vec::new(),
    );

    view.locate().await;

    assert_eq!(
        view.current_location().error(),
        Some("No internet connection and no weather data available.")
    );
}

#[tokio::test]
async fn test_current_location_from_fixed_position() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .and(query_param("query", "48.85,2.35"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body("Paris", 18)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let coords = Coordinates::new(48.85, 2.35);
    let cache = Cache::in_memory();
    let (notifier, mut rx) = Notifier::channel();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Fixed(coords))
            .with_notifier(notifier),
        Vec::new(),
    );

    view.show_current_location().await;

    assert_eq!(view.mode(), LandingMode::CurrentLocation);
    assert_eq!(view.current_location().data().unwrap().name(), "Paris");
    assert!(cache.get::<WeatherRecord>(&CacheKey::WeatherAt(coords)).is_some());

    rx.try_recv().unwrap();
    assert_eq!(
        rx.try_recv().unwrap(),
        Notice::Success("Weather data for your location: Paris loaded.".into())
    );
}

#[tokio::test]
async fn test_location_denied_is_reported_without_fallback() {
    let lookup_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&lookup_server)
        .await;

    let weather_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&weather_server)
        .await;

    let locator = IpLocator::new(
        &format!("{}/json", lookup_server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let mut view = LandingView::new(
        services(
            &weather_server.uri(),
            Cache::in_memory(),
            Geolocator::IpLookup(locator),
        ),
        cities(&["Tokyo"]),
    );

    view.locate().await;

    assert_eq!(view.current_location().error(), Some("Location access was denied."));
    assert!(view.grid().is_idle());
}

#[tokio::test]
async fn test_missing_geolocation_is_reported() {
    let mut view = LandingView::new(
        services(&closed_port_base(), Cache::in_memory(), Geolocator::Unavailable),
        Vec::new(),
    );
    view.locate().await;

    assert_eq!(
        view.current_location().error(),
        Some("Geolocation is not supported by this platform.")
    );
}

#[tokio::test]
async fn test_show_largest_cities_clears_search() {
    let mock_server = MockServer::start().await;
    mount_city(&mock_server, "Tokyo", "Tokyo").await;

    let mut view = LandingView::new(
        services(&mock_server.uri(), Cache::in_memory(), Geolocator::Unavailable),
        cities(&["Tokyo"]),
    );
    view.set_search_term("Tokyo");
    view.search().await;
    assert!(view.searched().data().is_some());

    view.show_largest_cities().await;

    assert_eq!(view.mode(), LandingMode::LargestCities);
    assert!(view.searched().is_idle());
    assert_eq!(grid_names(&view), vec!["Tokyo"]);
}

#[tokio::test]
async fn test_cancelled_bulk_fetch_writes_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(weather_body("Tokyo", 20))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let cache = Cache::in_memory();
    let mut view = LandingView::new(
        services(&mock_server.uri(), cache.clone(), Geolocator::Unavailable),
        cities(&["Tokyo"]),
    );

    let cancel = view.cancel_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    });

    view.load_cities().await;

    assert!(view.grid().is_idle());
    assert!(cache.get::<WeatherRecord>(&CacheKey::weather("Tokyo")).is_none());
}

#[tokio::test]
async fn test_dropping_view_cancels_token() {
    let view = LandingView::new(
        services(&closed_port_base(), Cache::in_memory(), Geolocator::Unavailable),
        Vec::new(),
    );
    let cancel = view.cancel_token();
    assert!(!cancel.is_cancelled());

    drop(view);
    assert!(cancel.is_cancelled());
}

#[test]
fn test_open_city_builds_encoded_route() {
    let view = LandingView::new(
        services(&closed_port_base(), Cache::in_memory(), Geolocator::Unavailable),
        Vec::new(),
    );
    assert_eq!(
        view.open_city("São Paulo").unwrap().path(),
        "/city/S%C3%A3o%20Paulo"
    );
    assert!(view.open_city("  ").is_none());
}
