//! Serial path relaxation.

use super::traits::RelaxOps;
use super::{relax_run, split_runs, stitch_runs};
use crate::float_types::Real;
use crate::path::simplify::KnotSet;
use crate::polyline::Polyline;
use crate::surface::SurfaceProvider;

/// Serial implementation of `RelaxOps`.
#[derive(Debug, Clone, Copy)]
pub struct SerialRelaxOps;

impl Default for SerialRelaxOps {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialRelaxOps {
    pub const fn new() -> Self {
        Self
    }
}

impl RelaxOps for SerialRelaxOps {
    fn relax_path(
        &self,
        path: &Polyline,
        knots: &KnotSet,
        iterations: usize,
        lambda: Real,
        surface: Option<&dyn SurfaceProvider>,
    ) -> Polyline {
        let mut runs = split_runs(path, knots);
        for run in &mut runs {
            relax_run(run, lambda, iterations, surface);
        }
        let mut out = path.clone();
        out.points_mut().copy_from_slice(&stitch_runs(runs));
        out
    }
}
