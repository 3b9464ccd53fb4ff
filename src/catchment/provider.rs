//! Routing provider boundary: request trait and isochrone response parsing.

use geo::{Coord, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::{CatchmentUnavailable, ProviderError};
use crate::models::Crs;

/// A service that returns the isochrone around a point for a travel-time budget
pub trait IsochroneProvider {
    /// CRS of the returned geometries
    fn crs(&self) -> Crs;

    fn isochrone(
        &self,
        location: Point<f64>,
        time_budget_secs: u32,
    ) -> impl Future<Output = Result<IsochroneResponse, ProviderError>> + Send;
}

/// GeoJSON feature collection as returned by isochrone APIs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IsochroneResponse {
    #[serde(default)]
    pub features: Vec<IsochroneFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsochroneFeature {
    pub geometry: Option<IsochroneGeometry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsochroneGeometry {
    #[serde(rename = "type")]
    pub geo_type: String,
    #[serde(default)]
    pub coordinates: serde_json::Value,
}

impl IsochroneResponse {
    /// Single-feature response wrapping a polygon's exterior ring
    pub fn from_polygon(polygon: &Polygon<f64>) -> Self {
        let ring: Vec<[f64; 2]> = polygon.exterior().coords().map(|c| [c.x, c.y]).collect();
        Self {
            features: vec![IsochroneFeature {
                geometry: Some(IsochroneGeometry {
                    geo_type: "Polygon".to_string(),
                    coordinates: serde_json::json!([ring]),
                }),
            }],
        }
    }

    /// Catchment polygon from the first feature's exterior ring
    pub fn into_polygon(self) -> Result<Polygon<f64>, CatchmentUnavailable> {
        let feature = self
            .features
            .into_iter()
            .next()
            .ok_or(CatchmentUnavailable::Empty)?;

        let geometry = feature.geometry.ok_or_else(|| CatchmentUnavailable::Malformed {
            reason: "feature has no geometry".to_string(),
        })?;

        if geometry.geo_type != "Polygon" {
            return Err(CatchmentUnavailable::Malformed {
                reason: format!("expected Polygon, got {}", geometry.geo_type),
            });
        }

        let rings: Vec<Vec<Vec<f64>>> = serde_json::from_value(geometry.coordinates)
            .map_err(|e| CatchmentUnavailable::Malformed {
                reason: format!("invalid coordinates: {}", e),
            })?;

        let exterior = match rings.into_iter().next() {
            Some(ring) if !ring.is_empty() => ring,
            _ => return Err(CatchmentUnavailable::Empty),
        };

        let mut coords = Vec::with_capacity(exterior.len() + 1);
        for position in exterior {
            match position.as_slice() {
                [x, y, ..] if x.is_finite() && y.is_finite() => coords.push(Coord { x: *x, y: *y }),
                _ => {
                    return Err(CatchmentUnavailable::Malformed {
                        reason: format!("invalid position {:?}", position),
                    })
                }
            }
        }

        // Close the ring if needed
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        if coords.len() < 4 {
            return Err(CatchmentUnavailable::Malformed {
                reason: format!("ring has only {} positions", coords.len()),
            });
        }

        Ok(Polygon::new(LineString::new(coords), vec![]))
    }
}
