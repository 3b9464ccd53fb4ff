//! Union of per-facility coverage, access partition and display weighting.

mod aggregator;
mod quantile;

pub use aggregator::{CoverageAggregator, FacilityCoverage};
pub use quantile::{equal_frequency_classes, quartile_bins, summarize};
