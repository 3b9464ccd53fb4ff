//! Sequential, rate-limited catchment retrieval.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::IsochroneProvider;
use crate::config::RoutingConfig;
use crate::error::{CatchmentUnavailable, ProviderError};
use crate::models::{Catchment, Facility};

/// A facility with its catchment, or the reason it has none
#[derive(Debug, Clone)]
pub struct FacilityCatchment {
    pub facility: Facility,
    pub catchment: Result<Catchment, CatchmentUnavailable>,
}

impl FacilityCatchment {
    pub fn is_available(&self) -> bool {
        self.catchment.is_ok()
    }
}

/// Longest pause between retries of one request
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(300);

/// `base * 2^(attempt - 1)`, capped at [`MAX_RETRY_BACKOFF`]
fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    2u32.checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .map_or(MAX_RETRY_BACKOFF, |delay| delay.min(MAX_RETRY_BACKOFF))
}

/// Enforces a minimum interval between consecutive requests
struct RequestPacer {
    min_interval: Duration,
    last_request: Option<Instant>,
}

impl RequestPacer {
    fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_request: None,
        }
    }

    /// Sleep until the next request may go out. Not a yield point for other
    /// pipeline work; the caller awaits it before doing anything else.
    async fn wait_turn(&mut self) {
        if let Some(last) = self.last_request {
            tokio::time::sleep_until(last + self.min_interval).await;
        }
        self.last_request = Some(Instant::now());
    }
}

/// Requests one isochrone per facility from a routing provider
pub struct CatchmentService<P> {
    provider: P,
    time_budget_secs: u32,
    max_retries: u32,
    retry_backoff: Duration,
    pacer: RequestPacer,
}

impl<P: IsochroneProvider> CatchmentService<P> {
    pub fn new(provider: P, config: &RoutingConfig) -> Self {
        Self {
            provider,
            time_budget_secs: config.time_budget_secs,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
            pacer: RequestPacer::new(config.request_delay()),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn time_budget_secs(&self) -> u32 {
        self.time_budget_secs
    }

    /// Catchment polygon for one facility.
    ///
    /// Transient failures are retried `max_retries` times with exponential
    /// backoff; rejected requests and malformed or empty responses are not.
    pub async fn catchment(&mut self, facility: &Facility) -> Result<Catchment, CatchmentUnavailable> {
        let attempts_allowed = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.pacer.wait_turn().await;
            debug!(
                "Requesting isochrone for {} ({}) attempt {}/{}",
                facility.id, facility.name, attempt, attempts_allowed
            );

            let error = match self
                .provider
                .isochrone(facility.point(), self.time_budget_secs)
                .await
            {
                Ok(response) => {
                    let polygon = response.into_polygon()?;
                    return Ok(Catchment {
                        facility_id: facility.id.clone(),
                        crs: self.provider.crs(),
                        time_budget_secs: self.time_budget_secs,
                        polygon,
                    });
                }
                Err(e) => e,
            };

            let transient = error.is_transient();
            if transient && attempt < attempts_allowed {
                let delay = backoff_delay(self.retry_backoff, attempt);
                warn!(
                    "Isochrone request for {} failed (attempt {}/{}): {}; retrying in {:?}",
                    facility.id, attempt, attempts_allowed, error, delay
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(match error {
                ProviderError::Malformed(reason) => CatchmentUnavailable::Malformed { reason },
                ProviderError::Status { status, .. } if !transient => {
                    CatchmentUnavailable::Rejected { status }
                }
                other => CatchmentUnavailable::Unreachable {
                    attempts: attempt,
                    reason: other.to_string(),
                },
            });
        }
    }

    /// Catchments for all facilities, strictly in order.
    ///
    /// `on_each` is called after every facility, e.g. to drive a progress bar.
    pub async fn catchments<F>(&mut self, facilities: &[Facility], mut on_each: F) -> Vec<FacilityCatchment>
    where
        F: FnMut(&FacilityCatchment),
    {
        info!(
            "Fetching {}s catchments for {} facilities",
            self.time_budget_secs,
            facilities.len()
        );

        let mut results = Vec::with_capacity(facilities.len());
        for facility in facilities {
            let catchment = self.catchment(facility).await;
            if let Err(reason) = &catchment {
                warn!("No catchment for {} ({}): {}", facility.id, facility.name, reason);
            }
            let outcome = FacilityCatchment {
                facility: facility.clone(),
                catchment,
            };
            on_each(&outcome);
            results.push(outcome);
        }

        let available = results.iter().filter(|r| r.is_available()).count();
        info!("Obtained {} of {} catchments", available, results.len());
        results
    }
}
