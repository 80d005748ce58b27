//! Errors

use thiserror::Error;

/// Errors surfaced to callers of the evaluator
#[derive(Debug, Error)]
pub enum GeofenceError {
    #[error("Invalid coordinates ({longitude}, {latitude}): both must be finite")]
    InvalidCoordinates { longitude: f64, latitude: f64 },
    #[error("Invalid radius {0}: must be a finite, non negative number of meters")]
    InvalidRadius(f64),
    #[error("Failed on fetch the history of `{user_id}`: {source}")]
    Upstream {
        user_id: String,
        #[source]
        source: SourceError,
    },
}

impl GeofenceError {
    /// Caused by the request itself rather than by the event store
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            GeofenceError::InvalidCoordinates { .. } | GeofenceError::InvalidRadius(_)
        )
    }
}

/// Event store failures
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed on query the history: {0}")]
    Query(String),
    #[error("Failed on parse the history: {0}")]
    Document(String),
    #[error("Failed on read the history: {0}")]
    Io(String),
}

/// Why a cluster has no usable boundary
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegenerateReason {
    TooFewPoints(usize),
    Collinear,
    /// A member has a NaN or infinite coordinate
    NonFinite,
}

/// A cluster whose hull cannot be computed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("cluster {label} is degenerate: {reason:?}")]
pub struct DegenerateGeometry {
    pub label: usize,
    pub reason: DegenerateReason,
}
