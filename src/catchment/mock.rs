//! Deterministic routing provider for offline runs and tests.

use geo::{Point, Polygon};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

use super::{IsochroneProvider, IsochroneResponse};
use crate::error::ProviderError;
use crate::models::Crs;

/// One recorded request
#[derive(Debug, Clone)]
pub struct MockCall {
    pub location: Point<f64>,
    pub time_budget_secs: u32,
    pub at: Instant,
}

/// Replays scripted responses in order, one per request, and records every
/// call. Once the script is exhausted each request fails with a transport
/// error.
#[derive(Debug)]
pub struct MockIsochroneProvider {
    crs: Crs,
    script: Mutex<VecDeque<Result<IsochroneResponse, ProviderError>>>,
    calls: Mutex<Vec<MockCall>>,
}

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockIsochroneProvider {
    pub fn new() -> Self {
        Self::with_crs(Crs::wgs84())
    }

    pub fn with_crs(crs: Crs) -> Self {
        Self {
            crs,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: IsochroneResponse) -> &Self {
        locked(&self.script).push_back(Ok(response));
        self
    }

    pub fn push_polygon(&self, polygon: &Polygon<f64>) -> &Self {
        self.push_response(IsochroneResponse::from_polygon(polygon))
    }

    pub fn push_error(&self, error: ProviderError) -> &Self {
        locked(&self.script).push_back(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        locked(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        locked(&self.calls).len()
    }
}

impl Default for MockIsochroneProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IsochroneProvider for MockIsochroneProvider {
    fn crs(&self) -> Crs {
        self.crs.clone()
    }

    async fn isochrone(
        &self,
        location: Point<f64>,
        time_budget_secs: u32,
    ) -> Result<IsochroneResponse, ProviderError> {
        locked(&self.calls).push(MockCall {
            location,
            time_budget_secs,
            at: Instant::now(),
        });
        locked(&self.script)
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Transport("no scripted response".to_string())))
    }
}
