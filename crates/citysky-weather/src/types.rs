use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Result of every weather lookup. Failures are data, never panics.
pub type FetchResult<T> = Result<T, FetchError>;

/// Why a weather lookup failed. `Display` yields the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("API URL or API key is missing in the environment variables")]
    ConfigMissing,
    #[error("Network response was not ok. Status: {0}")]
    Status(u16),
    #[error("{0}")]
    Upstream(String),
    #[error("Weather data is incomplete or unavailable.")]
    IncompleteData,
    /// Connection refused, DNS failure or timeout: the host looks offline
    #[error("Something went wrong while fetching weather data.")]
    Unreachable,
    #[error("Something went wrong while fetching weather data.")]
    Unknown,
}

impl FetchError {
    const DEFAULT_UPSTREAM_MESSAGE: &'static str = "Error fetching weather data.";

    /// Build an upstream failure from the API's `error.info`, if any.
    pub fn upstream(info: Option<&str>) -> Self {
        match info.map(str::trim).filter(|s| !s.is_empty()) {
            Some(info) => Self::Upstream(info.to_string()),
            None => Self::Upstream(Self::DEFAULT_UPSTREAM_MESSAGE.to_string()),
        }
    }

    /// True when the failure means the network is not reachable.
    pub fn is_offline(&self) -> bool {
        matches!(self, Self::Unreachable)
    }
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// A JSON object from the API, kept verbatim so every field (and its
/// original number type) survives a cache round trip.
pub type Fields = Map<String, Value>;

fn str_field<'a>(fields: &'a Fields, key: &str) -> Option<&'a str> {
    fields.get(key).and_then(Value::as_str)
}

/// Numeric field that may arrive as a JSON number or a numeric string.
fn number_field(fields: &Fields, key: &str) -> Option<f64> {
    match fields.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Echo of the query as the API understood it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestInfo(pub Fields);

impl RequestInfo {
    pub fn query(&self) -> Option<&str> {
        str_field(&self.0, "query")
    }

    /// `"City"`, `"LatLon"`, ...
    pub fn kind(&self) -> Option<&str> {
        str_field(&self.0, "type")
    }
}

/// Where the observation was made
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(pub Fields);

impl Location {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    pub fn country(&self) -> Option<&str> {
        str_field(&self.0, "country")
    }

    pub fn region(&self) -> Option<&str> {
        str_field(&self.0, "region")
    }

    pub fn latitude(&self) -> Option<f64> {
        number_field(&self.0, "lat")
    }

    pub fn longitude(&self) -> Option<f64> {
        number_field(&self.0, "lon")
    }

    pub fn localtime(&self) -> Option<&str> {
        str_field(&self.0, "localtime")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// Current conditions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrentWeather(pub Fields);

impl CurrentWeather {
    /// Degrees Celsius
    pub fn temperature(&self) -> Option<f64> {
        number_field(&self.0, "temperature")
    }

    pub fn feels_like(&self) -> Option<f64> {
        number_field(&self.0, "feelslike")
    }

    pub fn humidity(&self) -> Option<f64> {
        number_field(&self.0, "humidity")
    }

    pub fn wind_speed(&self) -> Option<f64> {
        number_field(&self.0, "wind_speed")
    }

    pub fn wind_dir(&self) -> Option<&str> {
        str_field(&self.0, "wind_dir")
    }

    pub fn observation_time(&self) -> Option<&str> {
        str_field(&self.0, "observation_time")
    }

    /// Text entries of `weather_descriptions`; anything else is skipped.
    pub fn descriptions(&self) -> Vec<&str> {
        match self.0.get("weather_descriptions") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(Value::String(s)) => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

/// One city's weather snapshot. Only constructed with both `location` and
/// `current` present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    pub location: Location,
    pub current: CurrentWeather,
}

impl WeatherRecord {
    /// Location name, or "Unknown Location" when the API omitted it.
    pub fn name(&self) -> &str {
        self.location.name().unwrap_or("Unknown Location")
    }

    /// All weather descriptions joined for display.
    pub fn description(&self) -> String {
        let descriptions = self.current.descriptions();
        if descriptions.is_empty() {
            "No description available".to_string()
        } else {
            descriptions.join(", ")
        }
    }

    /// Temperature in °C for display, "N/A" when missing.
    pub fn temperature_label(&self) -> String {
        match self.current.temperature() {
            Some(t) => format!("{}°C", t),
            None => "N/A°C".to_string(),
        }
    }

    /// Icon category derived from the first description.
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_description(self.current.descriptions().first().copied())
    }
}

/// Raw API body before the completeness check. Sections stay untyped so an
/// unexpected field type never turns a complete body into a decode error.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse {
    #[serde(default)]
    request: Option<Value>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    current: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

impl ApiResponse {
    /// Apply the validity rules: an `error` object wins, then both
    /// `location` and `current` must be objects.
    pub(crate) fn into_record(self) -> FetchResult<WeatherRecord> {
        if let Some(err) = self.error.filter(Value::is_object) {
            tracing::debug!(code = %err["code"], kind = %err["type"], "API returned an error object");
            return Err(FetchError::upstream(err["info"].as_str()));
        }

        match (self.location, self.current) {
            (Some(Value::Object(location)), Some(Value::Object(current))) => Ok(WeatherRecord {
                request: match self.request {
                    Some(Value::Object(request)) => Some(RequestInfo(request)),
                    _ => None,
                },
                location: Location(location),
                current: CurrentWeather(current),
            }),
            _ => Err(FetchError::IncompleteData),
        }
    }
}

/// Display categories for weather descriptions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    Sunny,
    Rain,
    Snow,
    Thunderstorm,
    Wind,
    #[default]
    Cloudy,
}

impl WeatherCondition {
    /// Classify a free-text description such as "Light Rain Shower".
    pub fn from_description(description: Option<&str>) -> Self {
        let lower = description.unwrap_or_default().to_lowercase();
        if lower.contains("sun") || lower.contains("clear") {
            Self::Sunny
        } else if lower.contains("rain") {
            Self::Rain
        } else if lower.contains("snow") {
            Self::Snow
        } else if lower.contains("thunder") || lower.contains("lightning") {
            Self::Thunderstorm
        } else if lower.contains("wind") {
            Self::Wind
        } else {
            Self::Cloudy
        }
    }

    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Sunny => "sun",
            Self::Rain => "cloud_rain",
            Self::Snow => "cloud_snow",
            Self::Thunderstorm => "cloud_lightning",
            Self::Wind => "wind",
            Self::Cloudy => "cloud",
        }
    }

    /// Single-glyph rendering for terminals
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Sunny => "☀",
            Self::Rain => "☂",
            Self::Snow => "❄",
            Self::Thunderstorm => "⚡",
            Self::Wind => "≋",
            Self::Cloudy => "☁",
        }
    }
}
