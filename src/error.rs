use thiserror::Error;

/// Top-level error type for the track graph core.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("arc radius must be positive, got {0}")]
    NonPositiveRadius(f64),
}

/// Errors related to the track graph store.
#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("control point not found")]
    ControlPointNotFound,

    #[error("segment not found")]
    SegmentNotFound,

    #[error("degenerate segment: {0}")]
    DegenerateSegment(String),

    #[error("intersection has no links")]
    EmptyIntersection,

    #[error("graph invariant violated: {0}")]
    InvariantViolated(String),
}

/// Errors related to path sampling.
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("sampling step must be finite and positive, got {0}")]
    InvalidStep(f64),
}

/// Errors raised while converting a stored track document.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("control point index {index} out of range (document has {len})")]
    ControlPointIndex { index: usize, len: usize },

    #[error("intersection has neither `links` nor all of `link1`..`link4`")]
    MissingIntersectionLinks,

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for results using [`TrackError`].
pub type Result<T, E = TrackError> = std::result::Result<T, E>;
