//! Facility discovery through the Overpass API.

use anyhow::{bail, Context, Result};
use geo::Rect;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::FacilityConfig;
use crate::models::{Crs, Facility, FacilitySet, OsmType};

/// Overpass server-side timeout in seconds
const QUERY_TIMEOUT_SECS: u64 = 180;

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    osm_type: OsmType,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    /// Present on ways and relations with `out center`
    center: Option<LatLon>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct LatLon {
    lat: f64,
    lon: f64,
}

impl OverpassElement {
    fn location(&self) -> Option<(f64, f64)> {
        match (self.lon, self.lat, &self.center) {
            (Some(lon), Some(lat), _) => Some((lon, lat)),
            (_, _, Some(c)) => Some((c.lon, c.lat)),
            _ => None,
        }
    }
}

/// Fetches `amenity=*` features inside a bounding box
pub struct OverpassClient {
    client: Client,
    endpoint: Url,
    amenities: Vec<String>,
}

impl OverpassClient {
    pub fn new(config: &FacilityConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.overpass_url)
            .with_context(|| format!("Invalid Overpass URL: {}", config.overpass_url))?;
        let client = Client::builder()
            .user_agent("healthreach/0.1 (catchment analysis)")
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS + 30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            endpoint,
            amenities: config.amenities.clone(),
        })
    }

    /// All matching facilities whose location lies in `bbox` (lon/lat).
    ///
    /// Results are in EPSG:4326. The box is coarser than the region, so the
    /// caller still has to restrict the set to the region polygon.
    pub async fn fetch(&self, bbox: Rect<f64>) -> Result<FacilitySet> {
        let query = build_query(&self.amenities, bbox);
        debug!("Overpass query:\n{}", query);
        info!(
            "Querying Overpass for {:?} in ({:.4}, {:.4}, {:.4}, {:.4})",
            self.amenities,
            bbox.min().y,
            bbox.min().x,
            bbox.max().y,
            bbox.max().x
        );

        let url = Url::parse_with_params(self.endpoint.as_str(), &[("data", query.as_str())])
            .context("Failed to build Overpass request URL")?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Overpass request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Overpass query failed with status {}: {}", status, body);
        }

        let data: OverpassResponse = response
            .json()
            .await
            .context("Failed to parse Overpass response")?;
        let set = facilities_from_elements(data.elements);
        info!("Overpass returned {} facilities", set.len());
        Ok(set)
    }
}

/// Overpass QL for nodes, ways and relations tagged with any of `amenities`
fn build_query(amenities: &[String], bbox: Rect<f64>) -> String {
    let bbox = format!(
        "{},{},{},{}",
        bbox.min().y,
        bbox.min().x,
        bbox.max().y,
        bbox.max().x
    );
    let mut query = format!("[out:json][timeout:{}];\n(\n", QUERY_TIMEOUT_SECS);
    for amenity in amenities {
        query.push_str(&format!(
            "  nwr[\"amenity\"=\"{}\"]({});\n",
            amenity.replace('"', "\\\""),
            bbox
        ));
    }
    query.push_str(");\nout center;\n");
    query
}

fn facilities_from_elements(elements: Vec<OverpassElement>) -> FacilitySet {
    let mut facilities = Vec::with_capacity(elements.len());
    let mut skipped = 0usize;
    for element in elements {
        let Some((lon, lat)) = element.location() else {
            skipped += 1;
            continue;
        };
        let name = element.tags.get("name").cloned();
        facilities.push(Facility::from_osm(element.osm_type, element.id, name, lon, lat));
    }
    if skipped > 0 {
        warn!("Skipped {} Overpass elements without coordinates", skipped);
    }
    FacilitySet::new(Crs::wgs84(), facilities)
}
