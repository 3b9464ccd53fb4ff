//! Boundary-inclusive point-in-polygon joins.

use geo::{BoundingRect, Intersects, Point, Rect};
use hashbrown::HashSet;
use tracing::{debug, info};

use super::CellIndex;
use crate::error::CrsMismatchError;
use crate::models::{Catchment, CellId, Crs, Facility, FacilitySet, PopulationCell, PopulationGrid, Region};

/// Anything with a point location
pub trait Located {
    fn location(&self) -> Point<f64>;
}

impl Located for PopulationCell {
    fn location(&self) -> Point<f64> {
        self.point()
    }
}

impl Located for Facility {
    fn location(&self) -> Point<f64> {
        self.point()
    }
}

fn in_rect(rect: &Rect<f64>, point: &Point<f64>) -> bool {
    point.x() >= rect.min().x
        && point.x() <= rect.max().x
        && point.y() >= rect.min().y
        && point.y() <= rect.max().y
}

/// Population cells inside the selected region, indexed for catchment queries
pub struct AreaOfInterest {
    pub region: Vec<String>,
    pub crs: Crs,
    cells: Vec<PopulationCell>,
    index: CellIndex,
}

impl AreaOfInterest {
    pub fn new(region: Vec<String>, crs: Crs, cells: Vec<PopulationCell>) -> Self {
        let index = CellIndex::build(&cells);
        Self {
            region,
            crs,
            cells,
            index,
        }
    }

    pub fn cells(&self) -> &[PopulationCell] {
        &self.cells
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

/// Cells reached by one catchment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoverageSet {
    pub cell_ids: HashSet<CellId>,
    pub population: u64,
}

impl CoverageSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cell_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cell_ids.is_empty()
    }
}

/// Stateless spatial join operations. Every operation checks that its inputs
/// share one CRS and fails without joining when they do not.
pub struct SpatialJoinEngine;

impl SpatialJoinEngine {
    /// Items lying inside or on the boundary of `area`
    pub fn within<'a, T, G>(
        items: &'a [T],
        items_crs: &Crs,
        area: &G,
        area_crs: &Crs,
    ) -> Result<Vec<&'a T>, CrsMismatchError>
    where
        T: Located,
        G: BoundingRect<f64> + Intersects<Point<f64>>,
    {
        CrsMismatchError::check("within", area_crs, items_crs)?;

        let Some(rect): Option<Rect<f64>> = area.bounding_rect().into() else {
            return Ok(Vec::new());
        };

        Ok(items
            .iter()
            .filter(|item| {
                let point = item.location();
                in_rect(&rect, &point) && area.intersects(&point)
            })
            .collect())
    }

    /// Restrict the population grid to the region
    pub fn area_of_interest(
        grid: &PopulationGrid,
        region: &Region,
    ) -> Result<AreaOfInterest, CrsMismatchError> {
        CrsMismatchError::check("population/region", &region.crs, &grid.crs)?;

        let cells: Vec<PopulationCell> =
            Self::within(&grid.cells, &grid.crs, &region.geometry, &region.crs)?
                .into_iter()
                .cloned()
                .collect();

        let aoi = AreaOfInterest::new(region.name_path.clone(), grid.crs.clone(), cells);
        info!(
            "Area of interest {:?}: {} of {} cells, population {}",
            aoi.region,
            aoi.len(),
            grid.len(),
            aoi.total_population()
        );
        Ok(aoi)
    }

    /// Facilities located in the region
    pub fn facilities_within(
        facilities: &FacilitySet,
        region: &Region,
    ) -> Result<Vec<Facility>, CrsMismatchError> {
        CrsMismatchError::check("facilities/region", &region.crs, &facilities.crs)?;

        let selected: Vec<Facility> = Self::within(
            &facilities.facilities,
            &facilities.crs,
            &region.geometry,
            &region.crs,
        )?
        .into_iter()
        .cloned()
        .collect();

        info!(
            "{} of {} facilities lie in {:?}",
            selected.len(),
            facilities.len(),
            region.name_path
        );
        Ok(selected)
    }

    /// Area-of-interest cells reached by a catchment, with their summed population
    pub fn covered_by(
        aoi: &AreaOfInterest,
        catchment: &Catchment,
    ) -> Result<CoverageSet, CrsMismatchError> {
        CrsMismatchError::check("population/catchment", &aoi.crs, &catchment.crs)?;

        let slots = aoi.index.locate_within(&aoi.cells, &catchment.polygon);
        let coverage = CoverageSet {
            cell_ids: slots.iter().map(|&s| aoi.cells[s].id).collect(),
            population: slots.iter().map(|&s| aoi.cells[s].population).sum(),
        };

        debug!(
            "Catchment of {} covers {} cells, population {}",
            catchment.facility_id,
            coverage.len(),
            coverage.population
        );
        Ok(coverage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon, Polygon};

    fn unit_square(offset: f64) -> Polygon<f64> {
        polygon![
            (x: offset, y: offset),
            (x: offset + 1.0, y: offset),
            (x: offset + 1.0, y: offset + 1.0),
            (x: offset, y: offset + 1.0),
            (x: offset, y: offset),
        ]
    }

    fn region(crs: Crs) -> Region {
        Region {
            name_path: vec!["State".into(), "District".into()],
            crs,
            geometry: MultiPolygon::new(vec![unit_square(0.0)]),
        }
    }

    fn grid(crs: Crs) -> PopulationGrid {
        PopulationGrid::new(
            crs,
            vec![
                PopulationCell::new(1, 0.5, 0.5, 10),
                PopulationCell::new(2, 1.0, 0.5, 20), // on the edge
                PopulationCell::new(3, 0.0, 0.0, 30), // on the corner
                PopulationCell::new(4, 1.5, 0.5, 40),
                PopulationCell::new(5, -0.1, 0.9, 50),
            ],
        )
    }

    #[test]
    fn test_area_of_interest_is_boundary_inclusive() {
        let aoi = SpatialJoinEngine::area_of_interest(&grid(Crs::wgs84()), &region(Crs::wgs84()))
            .unwrap();
        let ids: Vec<CellId> = aoi.cells().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(aoi.total_population(), 60);
        assert_eq!(aoi.region, vec!["State", "District"]);
    }

    #[test]
    fn test_population_region_crs_mismatch() {
        let err = SpatialJoinEngine::area_of_interest(
            &grid(Crs::new("EPSG:3857")),
            &region(Crs::wgs84()),
        )
        .err()
        .unwrap();
        assert_eq!(err.expected, Crs::wgs84());
        assert_eq!(err.found, Crs::new("EPSG:3857"));
    }

    #[test]
    fn test_catchment_crs_mismatch_skips_join() {
        let aoi = AreaOfInterest::new(
            vec![],
            Crs::new("EPSG:32645"),
            vec![PopulationCell::new(1, 0.5, 0.5, 10)],
        );
        let catchment = Catchment {
            facility_id: "node/1".into(),
            crs: Crs::wgs84(),
            time_budget_secs: 1800,
            polygon: unit_square(0.0),
        };
        let err = SpatialJoinEngine::covered_by(&aoi, &catchment).unwrap_err();
        assert_eq!(err.context, "population/catchment");
    }

    #[test]
    fn test_covered_by_sums_population() {
        let cells = vec![
            PopulationCell::new(10, 0.2, 0.2, 5),
            PopulationCell::new(11, 0.8, 0.8, 7),
            PopulationCell::new(12, 1.2, 1.2, 100),
            PopulationCell::new(13, 2.0, 2.0, 1), // corner of the shifted square
        ];
        let aoi = AreaOfInterest::new(vec![], Crs::wgs84(), cells);
        let catchment = Catchment {
            facility_id: "node/1".into(),
            crs: Crs::wgs84(),
            time_budget_secs: 1800,
            polygon: unit_square(0.0),
        };
        let coverage = SpatialJoinEngine::covered_by(&aoi, &catchment).unwrap();
        assert_eq!(coverage.population, 12);
        assert!(coverage.cell_ids.contains(&10) && coverage.cell_ids.contains(&11));
        assert_eq!(coverage.len(), 2);

        let shifted = Catchment {
            polygon: unit_square(1.0),
            ..catchment
        };
        let coverage = SpatialJoinEngine::covered_by(&aoi, &shifted).unwrap();
        assert_eq!(coverage.population, 101);
    }

    #[test]
    fn test_facilities_within_region() {
        let facilities = FacilitySet::new(
            Crs::wgs84(),
            vec![
                Facility::new("node/1", Some("Inside".into()), 0.5, 0.5),
                Facility::new("node/2", None, 3.0, 3.0),
            ],
        );
        let inside = SpatialJoinEngine::facilities_within(&facilities, &region(Crs::wgs84())).unwrap();
        assert_eq!(inside.len(), 1);
        assert_eq!(inside[0].name, "Inside");

        let projected = FacilitySet::new(Crs::new("EPSG:3857"), facilities.facilities.clone());
        assert!(SpatialJoinEngine::facilities_within(&projected, &region(Crs::wgs84())).is_err());
    }

    #[test]
    fn test_within_empty_polygon() {
        let empty = MultiPolygon::<f64>::new(vec![]);
        let cells = grid(Crs::wgs84()).cells;
        let inside = SpatialJoinEngine::within(&cells, &Crs::wgs84(), &empty, &Crs::wgs84()).unwrap();
        assert!(inside.is_empty());
    }
}
