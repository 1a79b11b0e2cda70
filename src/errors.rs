//! Contour errors

/// All the precondition and degeneracy failures a contour operation can report.
///
/// Surface provider misses (no ray hit, no cross-section) are not errors: they
/// surface as `None` so the caller can pick another seed or abandon the cut.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContourError {
    /// (MismatchedSegmentCount) Correspondence needs equal resampled point counts
    #[error("(MismatchedSegmentCount) expected {expected} resampled points, found {found}")]
    MismatchedSegmentCount { expected: usize, found: usize },
    /// (TooFewPoints) A path has fewer points than the operation requires
    #[error("(TooFewPoints) operation requires at least {required} points, found {found}")]
    TooFewPoints { required: usize, found: usize },
    /// (InvalidTargetCount) Resampling needs at least two output points
    #[error("(InvalidTargetCount) cannot resample to {0} points, at least 2 are required")]
    InvalidTargetCount(usize),
    /// (CyclicityMismatch) A closed loop cannot be matched against an open path
    #[error("(CyclicityMismatch) cannot align a closed loop with an open path")]
    CyclicityMismatch,
    /// (NotResampled) The contour has no uniformly resampled points yet
    #[error("(NotResampled) contour has not been resampled")]
    NotResampled,
    /// (InvalidEdge) An edge refers to a point that does not exist
    #[error("(InvalidEdge) edge ({0}, {1}) is out of range")]
    InvalidEdge(usize, usize),
    /// (DegenerateGeometry) Zero-length or collinear input where a direction is required
    #[error("(DegenerateGeometry) {0}")]
    DegenerateGeometry(String),
    /// Indicates an inconsistency while building a triangle mesh
    #[error(transparent)]
    TriMesh(#[from] crate::float_types::parry3d::shape::TriMeshBuilderError),
}
