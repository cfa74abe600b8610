use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::DomainError;

/// Center point of a map as latitude / longitude in decimal degrees.
///
/// Serialised as a `[lat, lon]` pair, the shape the generation backend expects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 2]", try_from = "[f64; 2]")]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub const MAX_LAT: f64 = 90.0;
    pub const MAX_LON: f64 = 180.0;

    pub fn new(lat: f64, lon: f64) -> Result<Self, DomainError> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(DomainError::InvalidCoordinates(format!(
                "{lat}, {lon} is not a finite point"
            )));
        }
        if lat.abs() > Self::MAX_LAT {
            return Err(DomainError::InvalidCoordinates(format!(
                "latitude {lat} is outside [-90, 90]"
            )));
        }
        if lon.abs() > Self::MAX_LON {
            return Err(DomainError::InvalidCoordinates(format!(
                "longitude {lon} is outside [-180, 180]"
            )));
        }
        Ok(Self { lat, lon })
    }

    /// Parses user input such as `45.28, 20.23`, `(45.28 20.23)` or `[45.28,20.23]`.
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let trimmed = input.trim();
        let inner = strip_brackets(trimmed).trim();

        if inner.is_empty() {
            return Err(DomainError::InvalidCoordinates(
                "coordinates are empty".to_string(),
            ));
        }

        let parts: Vec<&str> = if inner.contains(',') {
            inner.split(',').map(str::trim).collect()
        } else {
            inner.split_whitespace().collect()
        };

        let [lat, lon] = parts.as_slice() else {
            return Err(DomainError::InvalidCoordinates(format!(
                "expected \"lat, lon\", got {trimmed:?}"
            )));
        };

        let lat = parse_component(lat, "latitude")?;
        let lon = parse_component(lon, "longitude")?;
        Self::new(lat, lon)
    }

    pub fn lat(self) -> f64 {
        self.lat
    }

    pub fn lon(self) -> f64 {
        self.lon
    }
}

fn strip_brackets(s: &str) -> &str {
    for (open, close) in [('(', ')'), ('[', ']')] {
        if let Some(inner) = s.strip_prefix(open).and_then(|rest| rest.strip_suffix(close)) {
            return inner;
        }
    }
    s
}

fn parse_component(raw: &str, label: &str) -> Result<f64, DomainError> {
    raw.parse::<f64>()
        .map_err(|_| DomainError::InvalidCoordinates(format!("{label} {raw:?} is not a number")))
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

impl FromStr for Coordinates {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Coordinates> for [f64; 2] {
    fn from(value: Coordinates) -> Self {
        [value.lat, value.lon]
    }
}

impl TryFrom<[f64; 2]> for Coordinates {
    type Error = DomainError;

    fn try_from([lat, lon]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lat, lon)
    }
}
