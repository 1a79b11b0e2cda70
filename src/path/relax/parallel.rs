//! Parallel path relaxation: knot-bounded runs are independent, so each
//! one is relaxed on its own rayon task.

use super::traits::RelaxOps;
use super::{relax_run, split_runs, stitch_runs};
use crate::float_types::Real;
use crate::path::simplify::KnotSet;
use crate::polyline::Polyline;
use crate::surface::SurfaceProvider;
use rayon::prelude::*;

/// Parallel implementation of `RelaxOps`.
#[derive(Debug, Clone, Copy)]
pub struct ParallelRelaxOps;

impl Default for ParallelRelaxOps {
    fn default() -> Self {
        Self::new()
    }
}

impl ParallelRelaxOps {
    pub const fn new() -> Self {
        Self
    }
}

impl RelaxOps for ParallelRelaxOps {
    fn relax_path(
        &self,
        path: &Polyline,
        knots: &KnotSet,
        iterations: usize,
        lambda: Real,
        surface: Option<&dyn SurfaceProvider>,
    ) -> Polyline {
        let mut runs = split_runs(path, knots);
        runs.par_iter_mut()
            .for_each(|run| relax_run(run, lambda, iterations, surface));
        let mut out = path.clone();
        out.points_mut().copy_from_slice(&stitch_runs(runs));
        out
    }
}
