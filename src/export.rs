//! GeoJSON and JSON output of an access report.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use geo::Point;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{FacilityCoverageSummary, PopulationSummary};
use crate::pipeline::AccessReport;

/// Files written for one report
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub geojson: PathBuf,
    pub summary: PathBuf,
}

#[derive(Debug, Serialize)]
struct ReportSummary<'a> {
    computed_at: DateTime<Utc>,
    region: &'a [String],
    time_budget_secs: u32,
    total_population: u64,
    population_with_access: u64,
    population_without_access: u64,
    percent_with_access: f64,
    cells_with_access: usize,
    cells_without_access: usize,
    summary: &'a PopulationSummary,
    facilities: &'a [FacilityCoverageSummary],
}

/// File stem for a region path: ["West Bengal", "Nadia"] -> "west_bengal_nadia"
pub fn file_stem(region: &[String]) -> String {
    let stem = region
        .iter()
        .flat_map(|name| name.split(|c: char| !c.is_alphanumeric()))
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_");
    if stem.is_empty() {
        "region".to_string()
    } else {
        stem
    }
}

fn properties(value: serde_json::Value) -> Option<JsonObject> {
    match value {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    }
}

fn feature(value: Value, props: serde_json::Value) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties(props),
        foreign_members: None,
    }
}

/// One collection holding the region outline, facilities, catchments and
/// classified cells, distinguished by the `layer` property.
pub fn feature_collection(report: &AccessReport) -> FeatureCollection {
    let coverage = &report.coverage;
    let mut features = Vec::with_capacity(1 + 2 * report.catchments.len() + coverage.cells.len());

    features.push(feature(
        Value::from(&report.region.geometry),
        json!({
            "layer": "region",
            "name": report.region.display_name(),
            "crs": report.region.crs.as_str(),
        }),
    ));

    for outcome in &report.catchments {
        let facility = &outcome.facility;
        features.push(feature(
            Value::from(&facility.point()),
            json!({
                "layer": "facility",
                "id": facility.id,
                "name": facility.name,
                "catchment_available": outcome.is_available(),
            }),
        ));
        if let Ok(catchment) = &outcome.catchment {
            features.push(feature(
                Value::from(&catchment.polygon),
                json!({
                    "layer": "catchment",
                    "facility_id": catchment.facility_id,
                    "time_budget_secs": catchment.time_budget_secs,
                }),
            ));
        }
    }

    for cell in &coverage.cells {
        features.push(feature(
            Value::from(&Point::new(cell.x, cell.y)),
            json!({
                "layer": "cell",
                "id": cell.id,
                "population": cell.population,
                "has_access": cell.has_access,
                "weight_bin": cell.weight_bin,
                "opacity": cell.weight_bin.opacity(),
            }),
        ));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn summary_json(report: &AccessReport) -> Result<String> {
    let coverage = &report.coverage;
    let summary = ReportSummary {
        computed_at: report.computed_at,
        region: &coverage.region,
        time_budget_secs: report.time_budget_secs,
        total_population: coverage.total_population,
        population_with_access: coverage.population_with_access,
        population_without_access: coverage.population_without_access,
        percent_with_access: coverage.percent_with_access,
        cells_with_access: coverage.with_access().count(),
        cells_without_access: coverage.without_access().count(),
        summary: &coverage.summary,
        facilities: &coverage.facilities,
    };
    serde_json::to_string_pretty(&summary).context("Failed to serialize report summary")
}

/// Write `<stem>.geojson` and `<stem>_summary.json` into `dir`
pub fn write_report(report: &AccessReport, dir: &Path) -> Result<ExportPaths> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let stem = file_stem(&report.coverage.region);
    let paths = ExportPaths {
        geojson: dir.join(format!("{}.geojson", stem)),
        summary: dir.join(format!("{}_summary.json", stem)),
    };

    fs::write(&paths.geojson, feature_collection(report).to_string())
        .with_context(|| format!("Failed to write {}", paths.geojson.display()))?;
    fs::write(&paths.summary, summary_json(report)?)
        .with_context(|| format!("Failed to write {}", paths.summary.display()))?;

    info!(
        "Wrote {} and {}",
        paths.geojson.display(),
        paths.summary.display()
    );
    Ok(paths)
}
