//! Travel-time catchment polygons.

use geo::Polygon;

use super::Crs;

/// Area reachable from one facility within the time budget
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    pub facility_id: String,
    pub crs: Crs,
    pub time_budget_secs: u32,
    pub polygon: Polygon<f64>,
}
