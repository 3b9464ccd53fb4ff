//! Core data models for the accessibility pipeline.

pub mod catchment;
pub mod coverage;
pub mod crs;
pub mod facility;
pub mod population;
pub mod region;

pub use catchment::Catchment;
pub use coverage::{
    ClassifiedCell, CoverageResult, FacilityCoverageSummary, PopulationSummary, WeightBin,
};
pub use crs::Crs;
pub use facility::{Facility, FacilitySet, OsmType, UNNAMED_FACILITY};
pub use population::{CellId, PopulationCell, PopulationGrid};
pub use region::{BoundaryDataset, BoundaryFeature, LevelFilter, Region};
