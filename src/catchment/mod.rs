//! Travel-time catchments from an external routing provider.
//!
//! Requests are issued strictly one after another with a fixed minimum
//! pause between them. A facility whose isochrone cannot be obtained gets no
//! catchment; the run carries on without it.

mod mock;
mod ors;
mod provider;
mod service;

pub use mock::{MockCall, MockIsochroneProvider};
pub use ors::OpenRouteService;
pub use provider::{IsochroneFeature, IsochroneGeometry, IsochroneProvider, IsochroneResponse};
pub use service::{CatchmentService, FacilityCatchment};
