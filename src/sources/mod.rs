//! Input datasets: population grid, boundaries and facility locations.

pub mod geojson;
pub mod overpass;
pub mod population;

pub use self::geojson::{load_boundaries, load_facilities};
pub use overpass::OverpassClient;
pub use population::load_population;
