//! Client-side routes: `/` and `/city/:name`.
//!
//! City names travel percent-encoded in a single path segment, so names
//! containing `/`, `?`, `#`, `%` or spaces survive the round trip.

use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

const CITY_PREFIX: &str = "/city/";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("No page at {0}")]
    NotFound(String),
    #[error("City name is empty")]
    EmptyCity,
    #[error("City name is not valid UTF-8")]
    InvalidEncoding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    City(String),
}

impl Route {
    /// Details route for a city; `None` for a blank name.
    pub fn city(name: &str) -> Option<Self> {
        let name = name.trim();
        (!name.is_empty()).then(|| Self::City(name.to_string()))
    }

    pub fn path(&self) -> String {
        match self {
            Self::Landing => "/".to_string(),
            Self::City(name) => format!("{}{}", CITY_PREFIX, utf8_percent_encode(name, SEGMENT)),
        }
    }

    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        if trimmed.is_empty() || trimmed == "/" {
            return Ok(Self::Landing);
        }

        let segment = trimmed
            .strip_prefix(CITY_PREFIX)
            .map(|rest| rest.strip_suffix('/').unwrap_or(rest))
            .filter(|rest| !rest.contains('/'))
            .ok_or_else(|| RouteError::NotFound(trimmed.to_string()))?;

        let name = percent_decode_str(segment)
            .decode_utf8()
            .map_err(|_| RouteError::InvalidEncoding)?;

        Self::city(&name).ok_or(RouteError::EmptyCity)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.path())
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
