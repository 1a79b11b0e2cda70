//! Arc-length uniform resampling.

use crate::contour::order_edge_loop;
use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::polyline::{Edge, Polyline, chain_edges};
use nalgebra::Point3;

/// Point at arc length `s` along the path described by `points` and its
/// `cumulative` lengths (see [`Polyline::cumulative_lengths`]).
fn point_at_length(points: &[Point3<Real>], cumulative: &[Real], s: Real) -> Point3<Real> {
    let n = points.len();
    let segment_count = cumulative.len() - 1;
    let k = cumulative
        .partition_point(|&c| c <= s)
        .saturating_sub(1)
        .min(segment_count - 1);
    let a = points[k];
    let b = points[(k + 1) % n];
    let length = cumulative[k + 1] - cumulative[k];
    if length < tolerance() {
        return a;
    }
    a + (b - a) * ((s - cumulative[k]) / length)
}

/// Place `target_count` points at even arc-length intervals along `path`.
///
/// `phase_shift` offsets every sample by that fraction of one output segment.
/// Closed loops wrap around; open paths clamp at both ends, so with a zero
/// phase the first and last samples are the path's end points.
///
/// Returns the resampled polyline (same cyclicity as `path`) and its
/// consecutive edge list.
///
/// ## Errors
/// `InvalidTargetCount` when `target_count < 2`, or `< 3` for a closed loop.
pub fn resample(
    path: &Polyline,
    target_count: usize,
    phase_shift: Real,
) -> Result<(Polyline, Vec<Edge>), ContourError> {
    let cyclic = path.is_cyclic();
    if target_count < Polyline::min_points(cyclic) {
        return Err(ContourError::InvalidTargetCount(target_count));
    }

    let points = path.points();
    let cumulative = path.cumulative_lengths();
    let total = cumulative[cumulative.len() - 1];

    let samples: Vec<Point3<Real>> = if total < tolerance() {
        vec![points[0]; target_count]
    } else if cyclic {
        let n = target_count as Real;
        (0..target_count)
            .map(|i| {
                let s = (total * (i as Real + phase_shift) / n).rem_euclid(total);
                point_at_length(points, &cumulative, s)
            })
            .collect()
    } else {
        let n = (target_count - 1) as Real;
        (0..target_count)
            .map(|i| {
                let s = (total * ((i as Real + phase_shift) / n)).clamp(0.0, total);
                point_at_length(points, &cumulative, s)
            })
            .collect()
    };

    let edges = chain_edges(target_count, cyclic);
    Ok((Polyline::new(samples, cyclic)?, edges))
}

/// [`resample`] for raw point/edge data such as a mesh cross-section.
///
/// The edges are chained first, in any order and orientation (see
/// [`order_edge_loop`]); the path is closed when every point on it has two
/// neighbors.
///
/// ## Errors
/// `InvalidEdge` when an edge refers past `points`, `DegenerateGeometry` when
/// the edges do not form a single chain, plus the errors of [`resample`].
pub fn resample_edges(
    points: &[Point3<Real>],
    edges: &[Edge],
    target_count: usize,
    phase_shift: Real,
) -> Result<(Polyline, Vec<Edge>), ContourError> {
    let path = order_edge_loop(points, edges)?;
    resample(&path, target_count, phase_shift)
}
