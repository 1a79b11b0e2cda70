//! Freehand strokes drawn over a surface, turned into evenly spaced poly
//! nodes, quad rails and contours.
//!
//! The usual order of operations is
//! [`SketchLine::new`] → [`SketchLine::project`] → [`SketchLine::find_knots`]
//! → [`SketchLine::smooth_path`] → [`SketchLine::create_vert_nodes`], after
//! which a stroke can be split against other strokes, cut across the surface
//! or handed on as a [`Contour`].

use crate::config::{ContourConfig, VertNodeMode};
use crate::contour::Contour;
use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::path::intersect::split_against;
use crate::path::relax::relax_between_knots;
use crate::path::resample::resample;
use crate::path::simplify::{KnotSet, simplify};
use crate::plane::Plane;
use crate::polyline::{Polyline, bounding_box};
use crate::surface::{GeometryProvider, SurfaceProvider};
use nalgebra::{Point3, Unit, Vector3};

/// A stroke and everything derived from it.
#[derive(Debug, Clone, Default)]
pub struct SketchLine {
    /// Culled input samples: ray origins for [`SketchLine::project`].
    samples: Vec<Point3<Real>>,
    /// Samples that hit the surface.
    raw_world: Vec<Point3<Real>>,
    knots: KnotSet,
    /// `raw_world` after relaxation, on the surface.
    world_path: Vec<Point3<Real>>,
    path_normals: Vec<Vector3<Real>>,
    path_seeds: Vec<usize>,
    poly_nodes: Vec<Point3<Real>>,
    poly_normals: Vec<Vector3<Real>>,
    segments: usize,
    quad_length: Real,
}

fn path_length(points: &[Point3<Real>]) -> Real {
    points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
}

fn bounding_diagonal(points: &[Point3<Real>]) -> Real {
    let aabb = bounding_box(points);
    (aabb.maxs - aabb.mins).norm()
}

fn nearest_index(points: &[Point3<Real>], target: &Point3<Real>) -> usize {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, (p - target).norm_squared()))
        .fold((0, Real::MAX), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
        .0
}

/// Points from index `from` to index `to`, stepping forward or backward
/// (wrapping when `cyclic`).
fn arc(points: &[Point3<Real>], from: usize, to: usize, cyclic: bool, forward: bool) -> Vec<Point3<Real>> {
    let n = points.len();
    if !cyclic {
        return if from <= to {
            points[from..=to].to_vec()
        } else {
            points[to..=from].iter().rev().copied().collect()
        };
    }
    let steps = if forward {
        (to + n - from) % n
    } else {
        (from + n - to) % n
    };
    (0..=steps)
        .map(|k| {
            let i = if forward { from + k } else { from + n - k };
            points[i % n]
        })
        .collect()
}

impl SketchLine {
    /// Keep the first sample and every `cull_factor`-th one after it.
    pub fn new(samples: &[Point3<Real>], cull_factor: usize) -> Self {
        Self {
            samples: samples.iter().step_by(cull_factor.max(1)).copied().collect(),
            ..Self::default()
        }
    }

    /// A stroke that already lies on the surface, such as a split fragment.
    pub fn from_world_path(points: Vec<Point3<Real>>, config: &ContourConfig) -> Self {
        let mut line = Self {
            raw_world: points.clone(),
            world_path: points,
            ..Self::default()
        };
        line.find_knots(config);
        line
    }

    pub fn samples(&self) -> &[Point3<Real>] {
        &self.samples
    }

    pub fn raw_world(&self) -> &[Point3<Real>] {
        &self.raw_world
    }

    pub const fn knots(&self) -> &KnotSet {
        &self.knots
    }

    pub fn world_path(&self) -> &[Point3<Real>] {
        &self.world_path
    }

    /// Surface normals under [`SketchLine::world_path`], filled by [`SketchLine::smooth_path`].
    pub fn path_normals(&self) -> &[Vector3<Real>] {
        &self.path_normals
    }

    /// Surface faces under [`SketchLine::world_path`].
    pub fn path_seeds(&self) -> &[usize] {
        &self.path_seeds
    }

    pub fn poly_nodes(&self) -> &[Point3<Real>] {
        &self.poly_nodes
    }

    pub fn poly_normals(&self) -> &[Vector3<Real>] {
        &self.poly_normals
    }

    pub const fn segments(&self) -> usize {
        self.segments
    }

    pub const fn quad_length(&self) -> Real {
        self.quad_length
    }

    /// First and last point of the world path.
    pub fn endpoints(&self) -> Option<(Point3<Real>, Point3<Real>)> {
        Some((*self.world_path.first()?, *self.world_path.last()?))
    }

    /// Cast every sample along `direction` onto `surface`, keeping the hits.
    /// Returns the number of hits. Normals and faces of an earlier smoothed
    /// path are dropped.
    pub fn project(&mut self, surface: &dyn GeometryProvider, direction: &Vector3<Real>) -> usize {
        self.raw_world = self
            .samples
            .iter()
            .filter_map(|origin| surface.raycast(origin, direction))
            .map(|hit| hit.point)
            .collect();
        if self.raw_world.len() < self.samples.len() {
            log::debug!(
                "{} of {} stroke samples missed the surface",
                self.samples.len() - self.raw_world.len(),
                self.samples.len()
            );
        }
        self.world_path = self.raw_world.clone();
        self.path_normals.clear();
        self.path_seeds.clear();
        self.raw_world.len()
    }

    /// Detect corners of the projected stroke.
    pub fn find_knots(&mut self, config: &ContourConfig) -> &KnotSet {
        let error = config.feature_tolerance(bounding_diagonal(&self.raw_world));
        self.knots = simplify(&self.raw_world, error);
        log::debug!("stroke has {} knots", self.knots.len());
        &self.knots
    }

    /// Relax the stroke between its knots while keeping it on `surface`, then
    /// record the normal and face under every point.
    ///
    /// ## Errors
    /// `TooFewPoints` when fewer than two samples hit the surface.
    pub fn smooth_path(&mut self, config: &ContourConfig, surface: &dyn SurfaceProvider) -> Result<(), ContourError> {
        let path = Polyline::open(self.raw_world.clone())?;
        let relaxed = relax_between_knots(
            &path,
            &self.knots,
            config.smooth_iterations,
            config.relax_factor,
            Some(surface),
        );
        self.world_path = relaxed.into_points();
        self.snap_path(surface);
        Ok(())
    }

    fn snap_path(&mut self, surface: &dyn SurfaceProvider) {
        let hits = surface.snap_points(&mut self.world_path);
        self.path_normals = hits
            .iter()
            .map(|hit| hit.map_or_else(Vector3::zeros, |hit| hit.normal))
            .collect();
        self.path_seeds = hits.iter().map(|hit| hit.map_or(0, |hit| hit.face)).collect();
    }

    /// Place evenly spaced poly nodes along the world path.
    ///
    /// [`VertNodeMode::QuadSize`] derives the segment count from the quad
    /// length (`surface_diagonal / density_factor`); [`VertNodeMode::Segments`]
    /// uses `config.segments` and derives the quad length. Each knot span is
    /// resampled on its own so corners keep a node. Returns the node count.
    ///
    /// ## Errors
    /// `TooFewPoints` for a path under two points or when the stroke would get
    /// fewer than two segments.
    pub fn create_vert_nodes(&mut self, config: &ContourConfig, surface_diagonal: Real) -> Result<usize, ContourError> {
        if self.world_path.len() < 2 {
            return Err(ContourError::TooFewPoints {
                required: 2,
                found: self.world_path.len(),
            });
        }
        let length = path_length(&self.world_path);
        match config.vert_node_mode {
            VertNodeMode::QuadSize => {
                self.quad_length = config.quad_length(surface_diagonal);
                self.segments = if self.quad_length > 0.0 {
                    (length / self.quad_length).round() as usize
                } else {
                    0
                };
            },
            VertNodeMode::Segments => {
                self.segments = config.segments;
                self.quad_length = length / config.segments.max(1) as Real;
            },
        }
        if self.segments <= 1 {
            return Err(ContourError::TooFewPoints {
                required: 2,
                found: self.segments,
            });
        }

        let last = self.world_path.len() - 1;
        let indices = self.knots.indices();
        let spans: Vec<(usize, usize)> =
            if indices.len() >= 2 && indices[0] == 0 && indices[indices.len() - 1] == last {
                self.knots.spans().collect()
            } else {
                vec![(0, last)]
            };

        let mut nodes: Vec<Point3<Real>> = Vec::new();
        for (i, (start, end)) in spans.into_iter().enumerate() {
            let span = Polyline::open(self.world_path[start..=end].to_vec())?;
            let count = ((span.length() / self.quad_length).round() as usize).max(1);
            let (resampled, _) = resample(&span, count + 1, 0.0)?;
            let skip = usize::from(i > 0);
            nodes.extend(resampled.into_points().into_iter().skip(skip));
        }
        log::debug!("{} poly nodes for {} requested segments", nodes.len(), self.segments);
        self.poly_nodes = nodes;
        self.poly_normals.clear();
        Ok(self.poly_nodes.len())
    }

    /// Offset every poly node by `± width / 2` across the stroke, along
    /// `normal × tangent`. Returns the two rails of the quad strip.
    ///
    /// Nodes are snapped to `surface` first to pick up their normals. Where
    /// the normal is parallel to the stroke the node is left unshifted.
    ///
    /// ## Errors
    /// `TooFewPoints` before [`SketchLine::create_vert_nodes`].
    pub fn generate_rails(
        &mut self,
        surface: &dyn SurfaceProvider,
        width: Real,
    ) -> Result<(Vec<Point3<Real>>, Vec<Point3<Real>>), ContourError> {
        let n = self.poly_nodes.len();
        if n < 2 {
            return Err(ContourError::TooFewPoints { required: 2, found: n });
        }
        let hits = surface.snap_points(&mut self.poly_nodes);
        self.poly_normals = hits
            .iter()
            .map(|hit| hit.map_or_else(Vector3::zeros, |hit| hit.normal))
            .collect();

        let nodes = &self.poly_nodes;
        let mut upper = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);
        for i in 0..n {
            let tangent = if i == 0 {
                nodes[1] - nodes[0]
            } else if i == n - 1 {
                nodes[i] - nodes[i - 1]
            } else {
                ((nodes[i] - nodes[i - 1]) + (nodes[i + 1] - nodes[i])) * 0.5
            };
            let offset = Unit::try_new(self.poly_normals[i].cross(&tangent), tolerance())
                .map_or_else(Vector3::zeros, |side| side.into_inner() * (0.5 * width));
            upper.push(nodes[i] + offset);
            lower.push(nodes[i] - offset);
        }
        Ok((upper, lower))
    }

    /// Cut `surface` with the plane through both stroke ends that contains
    /// the averaged end normals, and keep the part of the cut between the
    /// ends, resampled to `segments` points.
    ///
    /// `Ok(None)` when the plane does not cross the face under the stroke head.
    ///
    /// ## Errors
    /// `TooFewPoints` for a stroke with fewer than two points, or
    /// `DegenerateGeometry` when the ends coincide or the normals run along
    /// the stroke.
    pub fn cut_by_endpoints(
        &mut self,
        surface: &dyn GeometryProvider,
        segments: usize,
    ) -> Result<Option<Contour>, ContourError> {
        let Some((head, tail)) = self.endpoints() else {
            return Err(ContourError::TooFewPoints {
                required: 2,
                found: self.world_path.len(),
            });
        };
        if self.path_seeds.len() != self.world_path.len() {
            log::debug!("stroke has no surface data, snapping it again");
            let hits: Vec<_> = self.world_path.iter().map(|p| surface.closest_point(p)).collect();
            self.path_normals = hits.iter().map(|h| h.map_or_else(Vector3::zeros, |h| h.normal)).collect();
            self.path_seeds = hits.iter().map(|h| h.map_or(0, |h| h.face)).collect();
        }

        let degenerate = |what: &str| ContourError::DegenerateGeometry(format!("stroke {what}"));
        let across = Unit::try_new(tail - head, tolerance()).ok_or_else(|| degenerate("ends coincide"))?;
        let average = (self.path_normals[0] + self.path_normals[self.path_normals.len() - 1]) * 0.5;
        let up = Unit::try_new(average, tolerance()).ok_or_else(|| degenerate("has no end normals"))?;
        let plane = Plane::new(head, up.cross(&across.into_inner()))?;

        let Some((cut, _)) = surface.cross_section(&plane, self.path_seeds[0]) else {
            return Ok(None);
        };
        let points = cut.points();
        let (from, to) = (nearest_index(points, &head), nearest_index(points, &tail));
        let mut between = if cut.is_cyclic() {
            let middle = self.world_path[self.world_path.len() / 2];
            let forward = arc(points, from, to, true, true);
            let backward = arc(points, from, to, true, false);
            let closeness =
                |candidate: &[Point3<Real>]| (candidate[nearest_index(candidate, &middle)] - middle).norm();
            if closeness(&forward) <= closeness(&backward) { forward } else { backward }
        } else {
            arc(points, from, to, false, true)
        };

        let eps = tolerance();
        if (between[0] - head).norm() > eps {
            between.insert(0, head);
        }
        if (between[between.len() - 1] - tail).norm() > eps {
            between.push(tail);
        }
        let mut contour = Contour::with_plane(Polyline::open(between)?, plane);
        contour.resample(segments)?;
        Ok(Some(contour))
    }

    /// Split this stroke wherever it crosses one of `others` and, up to
    /// `config.effective_split_depth()`, split those strokes where this one
    /// crosses them.
    ///
    /// Every split stroke is replaced by its first fragment; all remaining
    /// fragments come back as new strokes. Strokes with fewer than two
    /// points are ignored.
    ///
    /// ## Errors
    /// Propagates splitting failures; nothing is replaced in that case.
    pub fn intersect_other_paths(
        &mut self,
        others: &mut [SketchLine],
        config: &ContourConfig,
    ) -> Result<Vec<SketchLine>, ContourError> {
        let path = Polyline::open(self.world_path.clone())?;
        let (indices, paths): (Vec<usize>, Vec<Polyline>) = others
            .iter()
            .enumerate()
            .filter_map(|(i, other)| Polyline::open(other.world_path.clone()).ok().map(|p| (i, p)))
            .unzip();

        let outcome = split_against(
            &path,
            &paths,
            config.intersection_threshold,
            config.effective_split_depth(),
        )?;

        let mut created = Vec::new();
        let mut replace = |line: &mut SketchLine, fragments: Vec<Polyline>| {
            let mut fragments = fragments
                .into_iter()
                .map(|f| SketchLine::from_world_path(f.into_points(), config));
            if let Some(first) = fragments.next() {
                *line = first;
            }
            created.extend(fragments);
        };

        for (position, fragments) in outcome.others {
            replace(&mut others[indices[position]], fragments);
        }
        if outcome.fragments.len() > 1 {
            replace(self, outcome.fragments);
        }
        Ok(created)
    }

    /// An open contour over the world path, resampled to `segments` points.
    ///
    /// ## Errors
    /// `TooFewPoints` for a stroke with fewer than two points, or `InvalidTargetCount`.
    pub fn to_contour(&self, segments: usize) -> Result<Contour, ContourError> {
        let mut contour = Contour::new(Polyline::open(self.world_path.clone())?);
        contour.resample(segments)?;
        Ok(contour)
    }
}
