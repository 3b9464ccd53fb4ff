//! Error taxonomy for the accessibility pipeline.
//!
//! Structural errors ([`SelectionError`], [`CrsMismatchError`]) are fatal and
//! propagate to the caller. Routing failures ([`CatchmentUnavailable`]) are
//! absorbed per facility and recorded in the result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Crs;

/// The requested name path does not identify exactly one region
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("no region path given")]
    EmptyPath,

    #[error("boundary dataset has no level '{level}' (levels: {available:?})")]
    UnknownLevel { level: String, available: Vec<String> },

    #[error("no region named '{name}' at level {level} (candidates: {candidates:?})")]
    NotFound {
        level: String,
        name: String,
        candidates: Vec<String>,
    },

    #[error("{count} regions match {path:?}")]
    Ambiguous { path: Vec<String>, count: usize },

    #[error("region {path:?} has empty geometry")]
    EmptyGeometry { path: Vec<String> },
}

/// Inputs to a spatial join use different coordinate reference systems
#[derive(Error, Debug, Clone, PartialEq)]
#[error("CRS mismatch in {context}: expected {expected}, found {found}")]
pub struct CrsMismatchError {
    pub context: &'static str,
    pub expected: Crs,
    pub found: Crs,
}

impl CrsMismatchError {
    /// Ok when both systems match
    pub fn check(context: &'static str, expected: &Crs, found: &Crs) -> Result<(), Self> {
        if expected == found {
            Ok(())
        } else {
            Err(Self {
                context,
                expected: expected.clone(),
                found: found.clone(),
            })
        }
    }
}

/// Why a facility has no catchment polygon
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatchmentUnavailable {
    #[error("routing provider returned no isochrone")]
    Empty,

    #[error("malformed isochrone: {reason}")]
    Malformed { reason: String },

    #[error("routing provider rejected the request with HTTP {status}")]
    Rejected { status: u16 },

    #[error("routing provider unreachable after {attempts} attempts: {reason}")]
    Unreachable { attempts: u32, reason: String },
}

/// Failure reported by a routing provider for a single request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// Timeout, connection refused, DNS, ...
    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not decode response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Transport failures, throttling and server errors are worth one more try
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Transport(_) => true,
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Malformed(_) => false,
        }
    }
}

/// Fatal pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error(transparent)]
    CrsMismatch(#[from] CrsMismatchError),
}
