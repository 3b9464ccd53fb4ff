//! Healthcare facility records.

use geo::Point;
use serde::{Deserialize, Serialize};

use super::Crs;

/// Name given to facilities whose source record has none
pub const UNNAMED_FACILITY: &str = "Unnamed Facility";

/// Type of OSM object a facility was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl std::fmt::Display for OsmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// A facility location.
///
/// The name is resolved once at ingestion; an absent name becomes
/// [`UNNAMED_FACILITY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Unique source identifier, e.g. "node/123" for OSM features
    pub id: String,
    pub name: String,
    pub lon: f64,
    pub lat: f64,
}

impl Facility {
    pub fn new(id: impl Into<String>, name: Option<String>, lon: f64, lat: f64) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNNAMED_FACILITY.to_string());
        Self {
            id: id.into(),
            name,
            lon,
            lat,
        }
    }

    /// Build a facility from an OSM element
    pub fn from_osm(osm_type: OsmType, osm_id: i64, name: Option<String>, lon: f64, lat: f64) -> Self {
        Self::new(format!("{}/{}", osm_type, osm_id), name, lon, lat)
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }
}

/// Facilities sharing one CRS
#[derive(Debug, Clone)]
pub struct FacilitySet {
    pub crs: Crs,
    pub facilities: Vec<Facility>,
}

impl FacilitySet {
    pub fn new(crs: Crs, facilities: Vec<Facility>) -> Self {
        Self { crs, facilities }
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_name_defaults() {
        let f = Facility::from_osm(OsmType::Way, 42, None, 88.5, 23.4);
        assert_eq!(f.id, "way/42");
        assert_eq!(f.name, UNNAMED_FACILITY);

        let blank = Facility::new("x", Some("   ".to_string()), 0.0, 0.0);
        assert_eq!(blank.name, UNNAMED_FACILITY);
    }

    #[test]
    fn test_named_facility() {
        let f = Facility::new("node/1", Some(" District Hospital ".to_string()), 1.0, 2.0);
        assert_eq!(f.name, "District Hospital");
        assert_eq!(f.point(), Point::new(1.0, 2.0));
    }
}
