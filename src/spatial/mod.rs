//! Spatial joins between population cells, facilities and polygons.
//!
//! Cells of the area of interest are indexed in an R-tree so each catchment
//! only tests the cells inside its bounding box.

mod index;
mod join;

pub use index::CellIndex;
pub use join::{AreaOfInterest, CoverageSet, Located, SpatialJoinEngine};
