//! Healthreach - travel-time access to health facilities
//!
//! Estimates how much of a region's population lives within a travel-time
//! budget of at least one facility. Shared by the `analyze` binary and tests.

pub mod catchment;
pub mod config;
pub mod coverage;
pub mod error;
pub mod export;
pub mod models;
pub mod pipeline;
pub mod region;
pub mod sources;
pub mod spatial;

pub use error::{CatchmentUnavailable, CrsMismatchError, PipelineError, SelectionError};
pub use models::{CoverageResult, Facility, PopulationCell, Region};
