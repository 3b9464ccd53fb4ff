//! Administrative boundaries and the selected region of interest.

use geo::{BoundingRect, MultiPolygon, Rect};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Crs;

/// A single boundary polygon with its names at each admin level
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    /// Level key -> name, e.g. {"NAME_1": "West Bengal", "NAME_2": "Nadia"}
    pub names: HashMap<String, String>,
    pub geometry: MultiPolygon<f64>,
}

impl BoundaryFeature {
    pub fn name_at(&self, level: &str) -> Option<&str> {
        self.names.get(level).map(String::as_str)
    }
}

/// Boundary polygons of one country at one administrative depth.
///
/// `levels` lists the name keys from the top of the hierarchy down.
#[derive(Debug, Clone)]
pub struct BoundaryDataset {
    pub crs: Crs,
    pub levels: Vec<String>,
    pub features: Vec<BoundaryFeature>,
}

impl BoundaryDataset {
    pub fn new(crs: Crs, levels: Vec<String>, features: Vec<BoundaryFeature>) -> Self {
        Self {
            crs,
            levels,
            features,
        }
    }

    pub fn has_level(&self, level: &str) -> bool {
        self.levels.iter().any(|l| l == level)
    }
}

/// Name filter for one level of the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelFilter {
    pub level: String,
    pub name: String,
}

impl LevelFilter {
    pub fn new(level: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            name: name.into(),
        }
    }
}

impl std::str::FromStr for LevelFilter {
    type Err = String;

    /// Parse `LEVEL=NAME`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (level, name) = s
            .split_once('=')
            .ok_or_else(|| format!("expected LEVEL=NAME, got '{}'", s))?;
        let (level, name) = (level.trim(), name.trim());
        if level.is_empty() || name.is_empty() {
            return Err(format!("expected LEVEL=NAME, got '{}'", s));
        }
        Ok(Self::new(level, name))
    }
}

/// The region of interest
#[derive(Debug, Clone)]
pub struct Region {
    /// Names from the top level down, e.g. ["West Bengal", "Nadia"]
    pub name_path: Vec<String>,
    pub crs: Crs,
    pub geometry: MultiPolygon<f64>,
}

impl Region {
    pub fn bbox(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    /// Display name, most specific level first: "Nadia, West Bengal"
    pub fn display_name(&self) -> String {
        self.name_path
            .iter()
            .rev()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_filter() {
        let f: LevelFilter = "NAME_2 = Nadia".parse().unwrap();
        assert_eq!(f, LevelFilter::new("NAME_2", "Nadia"));
        assert!("NAME_2".parse::<LevelFilter>().is_err());
        assert!("=Nadia".parse::<LevelFilter>().is_err());
    }

    #[test]
    fn test_display_name() {
        let region = Region {
            name_path: vec!["West Bengal".into(), "Nadia".into()],
            crs: Crs::wgs84(),
            geometry: MultiPolygon::new(vec![]),
        };
        assert_eq!(region.display_name(), "Nadia, West Bengal");
        assert!(region.bbox().is_none());
    }
}
