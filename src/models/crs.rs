//! Coordinate reference system tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// WGS84 longitude/latitude, the CRS of OSM data and OpenRouteService isochrones.
pub const WGS84: &str = "EPSG:4326";

/// Coordinate reference system identifier (e.g. `EPSG:4326`).
///
/// Two geometries can only take part in the same spatial join when their
/// identifiers compare equal. Comparison is case-insensitive on the authority
/// prefix so `epsg:4326` and `EPSG:4326` are the same system.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Crs(String);

impl Crs {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_string())
    }

    pub fn wgs84() -> Self {
        Self::new(WGS84)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Crs {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for Crs {
    fn from(code: String) -> Self {
        Self::new(code)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(Crs::new("epsg:4326"), Crs::wgs84());
        assert_ne!(Crs::new("EPSG:3857"), Crs::wgs84());
    }

    #[test]
    fn test_deserialize_trims_whitespace() {
        let crs: Crs = serde_json::from_str("\" EPSG:32645 \"").unwrap();
        assert_eq!(crs.as_str(), "EPSG:32645");
        assert_eq!(serde_json::to_string(&crs).unwrap(), "\"EPSG:32645\"");
    }
}
