//! Laplacian-style relaxation of point chains, segment by segment.

pub mod serial;
pub mod traits;

#[cfg(feature = "parallel")]
pub mod parallel;

pub use traits::RelaxOps;

pub use serial::SerialRelaxOps;

#[cfg(feature = "parallel")]
pub use parallel::ParallelRelaxOps;

use crate::float_types::Real;
use crate::path::simplify::KnotSet;
use crate::polyline::Polyline;
use crate::surface::SurfaceProvider;
use nalgebra::Point3;

/// The relaxation backend selected by the `parallel` feature.
#[cfg(not(feature = "parallel"))]
pub type DefaultRelaxOps = SerialRelaxOps;
#[cfg(feature = "parallel")]
pub type DefaultRelaxOps = ParallelRelaxOps;

/// One pass: every interior point moves `lambda` of the way toward the
/// midpoint of its two neighbors. End points stay put.
pub(crate) fn relax_pass(points: &mut [Point3<Real>], lambda: Real) {
    if points.len() < 3 {
        return;
    }
    let previous = points.to_vec();
    for (i, p) in points.iter_mut().enumerate().take(previous.len() - 1).skip(1) {
        let average = nalgebra::center(&previous[i - 1], &previous[i + 1]);
        *p += (average - previous[i]) * lambda;
    }
}

/// Relax one knot-free run of points, re-projecting onto `surface` after
/// every pass when one is given.
pub(crate) fn relax_run(
    points: &mut [Point3<Real>],
    lambda: Real,
    iterations: usize,
    surface: Option<&dyn SurfaceProvider>,
) {
    for _ in 0..iterations {
        relax_pass(points, lambda);
        if let Some(surface) = surface {
            surface.snap_points(points);
        }
    }
}

/// Join runs that share their boundary knot into one chain.
pub(crate) fn stitch_runs(runs: Vec<Vec<Point3<Real>>>) -> Vec<Point3<Real>> {
    let mut out: Vec<Point3<Real>> = Vec::with_capacity(runs.iter().map(Vec::len).sum());
    for (i, run) in runs.into_iter().enumerate() {
        let skip = usize::from(i > 0 && !out.is_empty());
        out.extend(run.into_iter().skip(skip));
    }
    out
}

/// Copy the knot-bounded runs of `path` out, knots included at both ends of each run.
pub(crate) fn split_runs(path: &Polyline, knots: &KnotSet) -> Vec<Vec<Point3<Real>>> {
    let points = path.points();
    let last = points.len() - 1;
    let valid = knots.len() >= 2
        && knots.indices()[0] == 0
        && knots.indices()[knots.len() - 1] == last;
    if !valid {
        return vec![points.to_vec()];
    }
    knots
        .spans()
        .map(|(start, end)| points[start..=end].to_vec())
        .collect()
}

/// Relax `path` as a single run.
pub fn relax(
    path: &Polyline,
    iterations: usize,
    lambda: Real,
    surface: Option<&dyn SurfaceProvider>,
) -> Polyline {
    let mut out = path.clone();
    relax_run(out.points_mut(), lambda, iterations, surface);
    out
}

/// Relax `path` independently between consecutive knots so corners are
/// never smoothed away, using the default backend.
///
/// Knot sets that do not span the whole path are ignored and the path is
/// relaxed as one run.
pub fn relax_between_knots(
    path: &Polyline,
    knots: &KnotSet,
    iterations: usize,
    lambda: Real,
    surface: Option<&dyn SurfaceProvider>,
) -> Polyline {
    DefaultRelaxOps::new().relax_path(path, knots, iterations, lambda, surface)
}
