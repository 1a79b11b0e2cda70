//! Traits for path relaxation backends.

use crate::float_types::Real;
use crate::path::simplify::KnotSet;
use crate::polyline::Polyline;
use crate::surface::SurfaceProvider;

/// Knot-segmented relaxation of a path.
pub trait RelaxOps {
    /// Relax every run between consecutive knots of `path` for `iterations`
    /// passes of strength `lambda`, keeping the knots fixed. With a surface,
    /// all points are re-projected onto it after each pass.
    ///
    /// The returned path has the same point count and cyclicity as `path`.
    fn relax_path(
        &self,
        path: &Polyline,
        knots: &KnotSet,
        iterations: usize,
        lambda: Real,
        surface: Option<&dyn SurfaceProvider>,
    ) -> Polyline;
}
