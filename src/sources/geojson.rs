use anyhow::{anyhow, bail, Context, Result};
use geo::Centroid;
use geo_types::{Geometry, MultiPolygon, Point};
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{FacilityConfig, RegionConfig};
use crate::models::{BoundaryDataset, BoundaryFeature, Crs, Facility, FacilitySet};

fn read_collection(path: &Path) -> Result<FeatureCollection> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {}", path.display()))?;
    let geojson = GeoJson::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse GeoJSON: {}", path.display()))?;
    match geojson {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        _ => bail!("{} must be a FeatureCollection", path.display()),
    }
}

fn geometry_of(feature: &Feature) -> Option<Result<Geometry<f64>>> {
    let geometry = feature.geometry.as_ref()?;
    Some(
        Geometry::<f64>::try_from(geometry.value.clone())
            .map_err(|e| anyhow!("Failed to convert GeoJSON geometry: {}", e)),
    )
}

fn string_property(feature: &Feature, key: &str) -> Option<String> {
    match feature.property(key)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Load administrative boundaries, e.g. a GADM level-2 export.
pub fn load_boundaries(config: &RegionConfig) -> Result<BoundaryDataset> {
    info!("Loading boundaries from {}", config.boundaries.display());
    let collection = read_collection(&config.boundaries)?;
    let dataset = boundaries_from_collection(collection, config.crs.clone(), config.levels.clone())?;
    info!("Loaded {} boundary features", dataset.features.len());
    Ok(dataset)
}

pub fn boundaries_from_collection(
    collection: FeatureCollection,
    crs: Crs,
    levels: Vec<String>,
) -> Result<BoundaryDataset> {
    let mut features = Vec::with_capacity(collection.features.len());
    let mut skipped = 0usize;

    for feature in &collection.features {
        let geometry = match geometry_of(feature).transpose()? {
            Some(Geometry::MultiPolygon(mp)) => mp,
            Some(Geometry::Polygon(p)) => MultiPolygon::new(vec![p]),
            _ => {
                skipped += 1;
                continue;
            }
        };
        let names: HashMap<String, String> = levels
            .iter()
            .filter_map(|level| string_property(feature, level).map(|name| (level.clone(), name)))
            .collect();
        features.push(BoundaryFeature { names, geometry });
    }

    if skipped > 0 {
        warn!("Skipped {} boundary features without polygon geometry", skipped);
    }
    Ok(BoundaryDataset::new(crs, levels, features))
}

/// Load facility locations from a GeoJSON file.
///
/// Point features are used as-is; polygonal features contribute their centroid.
pub fn load_facilities(config: &FacilityConfig) -> Result<FacilitySet> {
    let path = config
        .path
        .as_deref()
        .context("facilities.path is required for the geojson source")?;
    info!("Loading facilities from {}", path.display());
    let collection = read_collection(path)?;
    let set = facilities_from_collection(collection, config.crs.clone(), &config.name_key)?;
    info!("Loaded {} facilities", set.len());
    Ok(set)
}

pub fn facilities_from_collection(
    collection: FeatureCollection,
    crs: Crs,
    name_key: &str,
) -> Result<FacilitySet> {
    let mut facilities = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.iter().enumerate() {
        let location: Option<Point<f64>> = match geometry_of(feature).transpose()? {
            Some(Geometry::Point(p)) => Some(p),
            Some(other) => other.centroid(),
            None => None,
        };
        let Some(location) = location else {
            debug!("Facility feature {} has no usable location", index);
            continue;
        };

        let id = match &feature.id {
            Some(Id::String(s)) => s.clone(),
            Some(Id::Number(n)) => n.to_string(),
            None => string_property(feature, "@id")
                .or_else(|| string_property(feature, "id"))
                .unwrap_or_else(|| format!("feature/{}", index)),
        };
        let name = string_property(feature, name_key);
        facilities.push(Facility::new(id, name, location.x(), location.y()));
    }

    Ok(FacilitySet::new(crs, facilities))
}
