//! Region of interest selection from an administrative boundary hierarchy.

mod selector;

pub use selector::RegionSelector;
