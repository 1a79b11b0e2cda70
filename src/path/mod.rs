//! Polyline processing for strokes and cross-sections: feature detection,
//! resampling, relaxation and intersection.

pub mod intersect;
pub mod relax;
pub mod resample;
pub mod simplify;

pub use intersect::{
    PathCut, PathIntersection, SplitOutcome, filter_endpoint_touches, intersect, split_against, split_at,
    split_at_cuts,
};
pub use relax::{RelaxOps, relax, relax_between_knots};
pub use resample::{resample, resample_edges};
pub use simplify::{KnotSet, distance_to_segment, simplify};
