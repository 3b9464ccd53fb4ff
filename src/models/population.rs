//! Gridded population cells.

use geo::Point;
use serde::{Deserialize, Serialize};

use super::Crs;

/// Stable identifier of a population grid cell
pub type CellId = u64;

/// One grid cell of the population raster, reduced to its center point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationCell {
    pub id: CellId,
    pub x: f64,
    pub y: f64,
    pub population: u64,
}

impl PopulationCell {
    pub fn new(id: CellId, x: f64, y: f64, population: u64) -> Self {
        Self { id, x, y, population }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.x, self.y)
    }
}

/// The full population dataset in a single CRS
#[derive(Debug, Clone)]
pub struct PopulationGrid {
    pub crs: Crs,
    pub cells: Vec<PopulationCell>,
}

impl PopulationGrid {
    pub fn new(crs: Crs, cells: Vec<PopulationCell>) -> Self {
        Self { crs, cells }
    }

    pub fn total_population(&self) -> u64 {
        self.cells.iter().map(|c| c.population).sum()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
