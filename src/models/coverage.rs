//! Coverage classification results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::CellId;
use crate::error::CatchmentUnavailable;

/// Quartile class of a cell's population, used to weight its display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightBin {
    Lowest,
    Low,
    High,
    Highest,
}

impl WeightBin {
    pub const COUNT: usize = 4;

    /// Bins in ascending order
    pub fn all() -> &'static [WeightBin] {
        &[
            WeightBin::Lowest,
            WeightBin::Low,
            WeightBin::High,
            WeightBin::Highest,
        ]
    }

    /// Bin for a zero-based quartile index; indices past the top clamp to `Highest`
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => WeightBin::Lowest,
            1 => WeightBin::Low,
            2 => WeightBin::High,
            _ => WeightBin::Highest,
        }
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Fill opacity for map layers
    pub fn opacity(&self) -> f64 {
        match self {
            WeightBin::Lowest => 0.1,
            WeightBin::Low => 0.25,
            WeightBin::High => 0.5,
            WeightBin::Highest => 1.0,
        }
    }
}

/// A population cell with its derived access flag and weight bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedCell {
    pub id: CellId,
    pub x: f64,
    pub y: f64,
    pub population: u64,
    pub has_access: bool,
    pub weight_bin: WeightBin,
}

/// Descriptive statistics over the area-of-interest cell populations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationSummary {
    pub cells: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub median: f64,
}

/// Per-facility outcome. `catchment_available == false` means coverage for
/// this facility is unknown, not that it reaches nobody.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacilityCoverageSummary {
    pub facility_id: String,
    pub name: String,
    pub catchment_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<CatchmentUnavailable>,
    pub covered_cells: usize,
    pub covered_population: u64,
}

/// Region-scoped access statistics and per-cell classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// Region name path, top level first
    pub region: Vec<String>,
    pub total_population: u64,
    pub population_with_access: u64,
    pub population_without_access: u64,
    /// Percentage in [0, 100]
    pub percent_with_access: f64,
    pub summary: PopulationSummary,
    pub facilities: Vec<FacilityCoverageSummary>,
    pub cells: Vec<ClassifiedCell>,
}

impl CoverageResult {
    pub fn with_access(&self) -> impl Iterator<Item = &ClassifiedCell> {
        self.cells.iter().filter(|c| c.has_access)
    }

    pub fn without_access(&self) -> impl Iterator<Item = &ClassifiedCell> {
        self.cells.iter().filter(|c| !c.has_access)
    }

    pub fn with_access_ids(&self) -> BTreeSet<CellId> {
        self.with_access().map(|c| c.id).collect()
    }

    pub fn without_access_ids(&self) -> BTreeSet<CellId> {
        self.without_access().map(|c| c.id).collect()
    }

    /// Facilities whose catchment could not be obtained
    pub fn unavailable_facilities(&self) -> impl Iterator<Item = &FacilityCoverageSummary> {
        self.facilities.iter().filter(|f| !f.catchment_available)
    }
}
