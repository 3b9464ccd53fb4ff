//! Combines per-facility coverage into the access classification.

use hashbrown::HashSet;
use tracing::{info, warn};

use super::{quartile_bins, summarize};
use crate::error::CatchmentUnavailable;
use crate::models::{CellId, ClassifiedCell, CoverageResult, Facility, FacilityCoverageSummary};
use crate::spatial::{AreaOfInterest, CoverageSet};

/// What one facility contributes to the union
#[derive(Debug, Clone)]
pub struct FacilityCoverage {
    pub facility: Facility,
    /// Cells reached, or why the catchment is missing
    pub coverage: Result<CoverageSet, CatchmentUnavailable>,
}

impl FacilityCoverage {
    /// Covered cells; empty when the catchment is unavailable
    pub fn cell_ids(&self) -> impl Iterator<Item = CellId> + '_ {
        self.coverage
            .as_ref()
            .into_iter()
            .flat_map(|set| set.cell_ids.iter().copied())
    }
}

pub struct CoverageAggregator;

impl CoverageAggregator {
    /// Classify every area-of-interest cell as with or without access.
    ///
    /// A cell has access when any facility's catchment reaches it. The two
    /// partitions are complementary over the area of interest. An empty area
    /// of interest yields zero totals and 0% rather than an error.
    pub fn aggregate(aoi: &AreaOfInterest, facilities: &[FacilityCoverage]) -> CoverageResult {
        let covered: HashSet<CellId> = facilities.iter().flat_map(|f| f.cell_ids()).collect();

        let bins = quartile_bins(aoi.cells());
        let cells: Vec<ClassifiedCell> = aoi
            .cells()
            .iter()
            .zip(bins)
            .map(|(cell, weight_bin)| ClassifiedCell {
                id: cell.id,
                x: cell.x,
                y: cell.y,
                population: cell.population,
                has_access: covered.contains(&cell.id),
                weight_bin,
            })
            .collect();

        let total_population: u64 = cells.iter().map(|c| c.population).sum();
        let population_with_access: u64 = cells
            .iter()
            .filter(|c| c.has_access)
            .map(|c| c.population)
            .sum();
        let population_without_access = total_population - population_with_access;

        let percent_with_access = if total_population == 0 {
            0.0
        } else {
            100.0 * population_with_access as f64 / total_population as f64
        };

        if aoi.is_empty() {
            warn!(
                "Area of interest {:?} contains no population cells",
                aoi.region
            );
        }

        let facilities: Vec<FacilityCoverageSummary> = facilities
            .iter()
            .map(|f| match &f.coverage {
                Ok(set) => FacilityCoverageSummary {
                    facility_id: f.facility.id.clone(),
                    name: f.facility.name.clone(),
                    catchment_available: true,
                    unavailable_reason: None,
                    covered_cells: set.len(),
                    covered_population: set.population,
                },
                Err(reason) => FacilityCoverageSummary {
                    facility_id: f.facility.id.clone(),
                    name: f.facility.name.clone(),
                    catchment_available: false,
                    unavailable_reason: Some(reason.clone()),
                    covered_cells: 0,
                    covered_population: 0,
                },
            })
            .collect();

        info!(
            "Population with access: {} of {} ({:.2}%)",
            population_with_access, total_population, percent_with_access
        );

        CoverageResult {
            region: aoi.region.clone(),
            total_population,
            population_with_access,
            population_without_access,
            percent_with_access,
            summary: summarize(aoi.cells()),
            facilities,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Crs, PopulationCell, WeightBin};

    fn aoi(populations: &[u64]) -> AreaOfInterest {
        let cells = populations
            .iter()
            .enumerate()
            .map(|(i, &p)| PopulationCell::new(i as u64 + 1, i as f64, 0.0, p))
            .collect();
        AreaOfInterest::new(vec!["State".into(), "District".into()], Crs::wgs84(), cells)
    }

    fn covering(id: &str, ids: &[CellId], aoi: &AreaOfInterest) -> FacilityCoverage {
        let population = aoi
            .cells()
            .iter()
            .filter(|c| ids.contains(&c.id))
            .map(|c| c.population)
            .sum();
        FacilityCoverage {
            facility: Facility::new(id, Some(id.to_uppercase()), 0.0, 0.0),
            coverage: Ok(CoverageSet {
                cell_ids: ids.iter().copied().collect(),
                population,
            }),
        }
    }

    fn unavailable(id: &str) -> FacilityCoverage {
        FacilityCoverage {
            facility: Facility::new(id, None, 0.0, 0.0),
            coverage: Err(CatchmentUnavailable::Empty),
        }
    }

    #[test]
    fn test_union_across_facilities() {
        let aoi = aoi(&[10, 20, 30, 40, 50, 60]);
        let facilities = vec![
            covering("a", &[1, 2, 3], &aoi),
            covering("b", &[3, 4], &aoi),
            unavailable("c"),
        ];
        let result = CoverageAggregator::aggregate(&aoi, &facilities);

        assert_eq!(result.with_access_ids().into_iter().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
        assert_eq!(result.without_access_ids().into_iter().collect::<Vec<_>>(), vec![5, 6]);
        assert_eq!(result.population_with_access, 100);
        assert_eq!(result.population_without_access, 110);
        assert_eq!(result.total_population, 210);
        assert!((result.percent_with_access - 47.619).abs() < 0.001);

        assert_eq!(result.facilities.len(), 3);
        assert!(result.facilities[0].catchment_available);
        assert_eq!(result.facilities[1].covered_population, 70);
        let missing: Vec<_> = result.unavailable_facilities().collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].unavailable_reason, Some(CatchmentUnavailable::Empty));
    }

    #[test]
    fn test_unavailable_facility_changes_nothing() {
        let aoi = aoi(&[10, 20, 30, 40, 50, 60]);
        let without = CoverageAggregator::aggregate(&aoi, &[covering("a", &[1, 5], &aoi)]);
        let with = CoverageAggregator::aggregate(
            &aoi,
            &[covering("a", &[1, 5], &aoi), unavailable("b")],
        );
        assert_eq!(with.cells, without.cells);
        assert_eq!(with.percent_with_access, without.percent_with_access);
    }

    #[test]
    fn test_weight_bins_independent_of_access() {
        let aoi = aoi(&[10, 20, 30, 40, 50, 60]);
        let none = CoverageAggregator::aggregate(&aoi, &[]);
        let all = CoverageAggregator::aggregate(&aoi, &[covering("a", &[1, 2, 3, 4, 5, 6], &aoi)]);
        let bins = |r: &CoverageResult| r.cells.iter().map(|c| c.weight_bin).collect::<Vec<_>>();
        assert_eq!(bins(&none), bins(&all));
        assert_eq!(bins(&none)[0], WeightBin::Lowest);
        assert_eq!(bins(&none)[5], WeightBin::Highest);

        assert_eq!(none.percent_with_access, 0.0);
        assert_eq!(all.percent_with_access, 100.0);
    }

    #[test]
    fn test_partition_is_exhaustive() {
        let aoi = aoi(&[3, 0, 9, 1, 4, 4, 7]);
        // ids outside the area of interest are ignored
        let result = CoverageAggregator::aggregate(&aoi, &[covering("a", &[2, 4, 99], &aoi)]);
        assert_eq!(
            result.with_access().count() + result.without_access().count(),
            aoi.len()
        );
        assert!(result
            .with_access_ids()
            .is_disjoint(&result.without_access_ids()));
        assert_eq!(
            result.population_with_access + result.population_without_access,
            aoi.total_population()
        );
    }

    #[test]
    fn test_empty_area_of_interest() {
        let aoi = aoi(&[]);
        let result = CoverageAggregator::aggregate(&aoi, &[unavailable("a")]);
        assert_eq!(result.total_population, 0);
        assert_eq!(result.percent_with_access, 0.0);
        assert!(result.cells.is_empty());
        assert_eq!(result.summary.cells, 0);
    }

    #[test]
    fn test_zero_population_cells_give_zero_percent() {
        let aoi = aoi(&[0, 0]);
        let result = CoverageAggregator::aggregate(&aoi, &[covering("a", &[1], &aoi)]);
        assert_eq!(result.percent_with_access, 0.0);
        assert_eq!(result.with_access().count(), 1);
    }
}
