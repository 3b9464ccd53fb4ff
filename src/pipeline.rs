//! End-to-end accessibility run for one region.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::catchment::{CatchmentService, FacilityCatchment, IsochroneProvider};
use crate::coverage::{CoverageAggregator, FacilityCoverage};
use crate::error::{CrsMismatchError, PipelineError};
use crate::models::{CoverageResult, FacilitySet, PopulationGrid, Region};
use crate::spatial::SpatialJoinEngine;

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct AccessReport {
    pub computed_at: DateTime<Utc>,
    pub region: Region,
    pub time_budget_secs: u32,
    /// Per facility in the region, in request order
    pub catchments: Vec<FacilityCatchment>,
    pub coverage: CoverageResult,
}

impl AccessReport {
    pub fn available_catchments(&self) -> usize {
        self.catchments.iter().filter(|c| c.is_available()).count()
    }
}

pub struct AccessPipeline<P> {
    service: CatchmentService<P>,
}

impl<P: IsochroneProvider> AccessPipeline<P> {
    pub fn new(service: CatchmentService<P>) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &CatchmentService<P> {
        &self.service
    }

    /// Region → area of interest → catchments → coverage.
    ///
    /// CRS agreement between region, population, facilities and the routing
    /// provider is checked before any request goes out. Facilities outside
    /// the region are never routed. `on_each` sees every catchment outcome as
    /// soon as it is known.
    pub async fn run<F>(
        &mut self,
        region: &Region,
        grid: &PopulationGrid,
        facilities: &FacilitySet,
        on_each: F,
    ) -> Result<AccessReport, PipelineError>
    where
        F: FnMut(&FacilityCatchment),
    {
        info!("Analysing access for {}", region.display_name());

        CrsMismatchError::check(
            "population/catchment",
            &grid.crs,
            &self.service.provider().crs(),
        )?;
        let in_region = SpatialJoinEngine::facilities_within(facilities, region)?;
        let aoi = SpatialJoinEngine::area_of_interest(grid, region)?;

        let catchments = self.service.catchments(&in_region, on_each).await;

        let mut coverage = Vec::with_capacity(catchments.len());
        for outcome in &catchments {
            let covered = match &outcome.catchment {
                Ok(catchment) => Ok(SpatialJoinEngine::covered_by(&aoi, catchment)?),
                Err(reason) => Err(reason.clone()),
            };
            coverage.push(FacilityCoverage {
                facility: outcome.facility.clone(),
                coverage: covered,
            });
        }

        let result = CoverageAggregator::aggregate(&aoi, &coverage);
        Ok(AccessReport {
            computed_at: Utc::now(),
            region: region.clone(),
            time_budget_secs: self.service.time_budget_secs(),
            catchments,
            coverage: result,
        })
    }
}
