//! TOML configuration for an accessibility run.
//!
//! Loaded once and passed by reference into each component; nothing reads
//! configuration from ambient state afterwards.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::{Crs, LevelFilter};

/// Environment variable consulted when `routing.api_key` is not set
pub const API_KEY_ENV: &str = "ORS_API_KEY";

/// Upper bound accepted for `routing.max_retries`
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct AccessConfig {
    pub region: RegionConfig,
    pub population: PopulationConfig,
    pub facilities: FacilityConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RegionConfig {
    /// GeoJSON FeatureCollection of admin boundaries
    pub boundaries: PathBuf,
    #[serde(default)]
    pub crs: Crs,
    /// Name properties from the top of the hierarchy down
    #[serde(default = "default_levels")]
    pub levels: Vec<String>,
    /// Filters applied in order
    #[serde(default)]
    pub path: Vec<LevelFilter>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PopulationConfig {
    /// CSV (optionally gzipped) with one row per grid cell
    pub csv: PathBuf,
    #[serde(default)]
    pub crs: Crs,
    #[serde(default = "default_x_column")]
    pub x_column: String,
    #[serde(default = "default_y_column")]
    pub y_column: String,
    #[serde(default = "default_population_column")]
    pub population_column: String,
    /// Row index is used as the cell id when absent
    #[serde(default)]
    pub id_column: Option<String>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FacilitySource {
    Overpass,
    Geojson,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FacilityConfig {
    pub source: FacilitySource,
    /// Required for the geojson source
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub crs: Crs,
    #[serde(default = "default_overpass_url")]
    pub overpass_url: String,
    /// Values of the OSM `amenity` tag to fetch
    #[serde(default = "default_amenities")]
    pub amenities: Vec<String>,
    /// Property holding the facility name in GeoJSON input
    #[serde(default = "default_name_key")]
    pub name_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RoutingConfig {
    #[serde(default = "default_routing_url")]
    pub base_url: String,
    #[serde(default = "default_profile")]
    pub profile: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_time_budget")]
    pub time_budget_secs: u32,
    /// Minimum pause between consecutive provider requests
    #[serde(default = "default_request_delay")]
    pub request_delay_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_levels() -> Vec<String> {
    vec!["NAME_1".to_string(), "NAME_2".to_string()]
}

fn default_x_column() -> String {
    "X".to_string()
}

fn default_y_column() -> String {
    "Y".to_string()
}

fn default_population_column() -> String {
    "Z".to_string()
}

fn default_delimiter() -> char {
    ','
}

fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}

fn default_amenities() -> Vec<String> {
    vec!["hospital".to_string()]
}

fn default_name_key() -> String {
    "name".to_string()
}

fn default_routing_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_profile() -> String {
    "driving-car".to_string()
}

fn default_time_budget() -> u32 {
    1800
}

fn default_request_delay() -> u64 {
    3
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff() -> u64 {
    5
}

fn default_timeout() -> u64 {
    60
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_url(),
            profile: default_profile(),
            api_key: None,
            time_budget_secs: default_time_budget(),
            request_delay_secs: default_request_delay(),
            max_retries: default_max_retries(),
            retry_backoff_secs: default_retry_backoff(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl RoutingConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_secs(self.request_delay_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured key, else the `ORS_API_KEY` environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        let usable = |k: &String| !k.trim().is_empty();
        self.api_key
            .clone()
            .filter(usable)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(usable))
    }
}

impl AccessConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AccessConfig = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.region.path.is_empty() {
            bail!("region.path must name at least one level");
        }
        if self.region.levels.is_empty() {
            bail!("region.levels must not be empty");
        }
        if let Some(unknown) = self
            .region
            .path
            .iter()
            .find(|f| !self.region.levels.contains(&f.level))
        {
            bail!(
                "region.path level '{}' is not one of {:?}",
                unknown.level,
                self.region.levels
            );
        }
        if self.routing.time_budget_secs == 0 {
            bail!("routing.time_budget_secs must be positive");
        }
        if self.routing.request_delay_secs == 0 {
            bail!("routing.request_delay_secs must be at least 1 to respect the provider rate limit");
        }
        if self.routing.max_retries > MAX_RETRIES {
            bail!(
                "routing.max_retries must be at most {} (got {})",
                MAX_RETRIES,
                self.routing.max_retries
            );
        }
        if self.facilities.source == FacilitySource::Geojson && self.facilities.path.is_none() {
            bail!("facilities.path is required for the geojson source");
        }
        if self.facilities.amenities.is_empty() {
            bail!("facilities.amenities must not be empty");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [region]
        boundaries = "gadm41_IND_2.json"
        path = [
            { level = "NAME_1", name = "West Bengal" },
            { level = "NAME_2", name = "Nadia" },
        ]

        [population]
        csv = "ppp_IND_2020_1km_Aggregated_UNadj.csv"

        [facilities]
        source = "overpass"
    "#;

    #[test]
    fn test_defaults() {
        let config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.region.crs, Crs::wgs84());
        assert_eq!(config.region.levels, vec!["NAME_1", "NAME_2"]);
        assert_eq!(config.region.path[1], LevelFilter::new("NAME_2", "Nadia"));
        assert_eq!(config.population.population_column, "Z");
        assert_eq!(config.population.id_column, None);
        assert_eq!(config.facilities.amenities, vec!["hospital"]);
        assert_eq!(config.routing.time_budget_secs, 1800);
        assert_eq!(config.routing.request_delay(), Duration::from_secs(3));
        assert_eq!(config.routing.max_retries, 1);
        assert_eq!(config.routing.profile, "driving-car");
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn test_validation_failures() {
        let mut config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.routing.time_budget_secs = 0;
        assert!(config.validate().is_err());

        let mut config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.routing.request_delay_secs = 0;
        assert!(config.validate().is_err());

        let mut config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.routing.max_retries = 40;
        assert!(config.validate().is_err());
        config.routing.max_retries = MAX_RETRIES;
        config.validate().unwrap();

        let mut config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.facilities.source = FacilitySource::Geojson;
        assert!(config.validate().is_err());

        let mut config: AccessConfig = toml::from_str(MINIMAL).unwrap();
        config.region.path.push(LevelFilter::new("NAME_3", "Krishnanagar"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let routing = RoutingConfig {
            api_key: Some("secret".to_string()),
            ..RoutingConfig::default()
        };
        assert_eq!(routing.resolved_api_key().as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access.toml");
        fs::write(&path, MINIMAL).unwrap();
        let config = AccessConfig::load_from_file(&path).unwrap();
        assert_eq!(config.region.path.len(), 2);

        assert!(AccessConfig::load_from_file(dir.path().join("missing.toml")).is_err());
    }
}
