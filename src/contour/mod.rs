//! Contours: a raw loop or path plus its uniformly resampled counterpart.
//!
//! The resampled points are always derived from the raw points as
//! `resample(raw, segments, phase_shift)` rotated by `discrete_shift`, so the
//! two shifts can be changed freely without the raw data drifting.

pub mod align;
pub mod edge_loop;
pub mod relationship;

pub use align::{AlignmentReport, PHASE_SEARCH_ITERATIONS, connectivity_quality};
pub use edge_loop::order_edge_loop;
pub use relationship::RelationshipReport;

use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::path::resample::resample;
use crate::plane::Plane;
use crate::polyline::{Edge, Polyline, best_fit_plane};
use crate::surface::{GeometryProvider, SurfaceProvider};
use nalgebra::{Point3, Unit, Vector3};

/// A cross-section loop or stroke path ready to be matched against its neighbors.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    raw: Polyline,
    simple: Option<Polyline>,
    /// Index rotation applied to the resampled points.
    discrete_shift: isize,
    /// Resample offset in output segment widths.
    phase_shift: Real,
    plane: Option<Plane>,
    com: Option<Point3<Real>>,
}

impl Contour {
    /// A contour with no resampled points yet. Call [`Contour::resample`] before aligning.
    pub const fn new(raw: Polyline) -> Self {
        Self {
            raw,
            simple: None,
            discrete_shift: 0,
            phase_shift: 0.0,
            plane: None,
            com: None,
        }
    }

    /// A contour that came from cutting a surface with `plane`.
    pub fn with_plane(raw: Polyline, plane: Plane) -> Self {
        Self {
            plane: Some(plane),
            ..Self::new(raw)
        }
    }

    /// Build from raw points and their ordered edge list.
    pub fn from_edges(points: Vec<Point3<Real>>, edges: &[Edge]) -> Result<Self, ContourError> {
        Ok(Self::new(order_edge_loop(&points, edges)?))
    }

    /// Cut `surface` with `plane` starting from `seed_face` and resample the cut
    /// to `segments` points.
    ///
    /// `Ok(None)` when the plane does not cross the seed face.
    pub fn from_cross_section(
        surface: &dyn GeometryProvider,
        plane: Plane,
        seed_face: usize,
        segments: usize,
    ) -> Result<Option<Self>, ContourError> {
        let Some((raw, _)) = surface.cross_section(&plane, seed_face) else {
            log::debug!("plane does not cross face {seed_face}");
            return Ok(None);
        };
        let mut contour = Self::with_plane(raw, plane);
        contour.resample(segments)?;
        Ok(Some(contour))
    }

    pub const fn raw(&self) -> &Polyline {
        &self.raw
    }

    /// The uniformly resampled points.
    ///
    /// ## Errors
    /// `NotResampled` before the first [`Contour::resample`].
    pub fn simple(&self) -> Result<&Polyline, ContourError> {
        self.simple.as_ref().ok_or(ContourError::NotResampled)
    }

    pub const fn is_cyclic(&self) -> bool {
        self.raw.is_cyclic()
    }

    /// Number of resampled points, `None` before resampling.
    pub fn segments(&self) -> Option<usize> {
        self.simple.as_ref().map(Polyline::len)
    }

    pub const fn discrete_shift(&self) -> isize {
        self.discrete_shift
    }

    pub const fn phase_shift(&self) -> Real {
        self.phase_shift
    }

    pub const fn plane(&self) -> Option<&Plane> {
        self.plane.as_ref()
    }

    pub fn set_plane(&mut self, plane: Plane) {
        self.plane = Some(plane);
    }

    /// Center of mass cached by the last [`Contour::update_com`].
    pub const fn com(&self) -> Option<Point3<Real>> {
        self.com
    }

    /// `resample(raw, segments, phase)` rotated by `shift`.
    fn derive_simple(&self, segments: usize, phase: Real, shift: isize) -> Result<Polyline, ContourError> {
        let (resampled, _) = resample(&self.raw, segments, phase)?;
        Ok(if self.raw.is_cyclic() && shift != 0 {
            resampled.rotated(shift)
        } else {
            resampled
        })
    }

    /// (Re)build the resampled points with `segments` points at the current shifts.
    ///
    /// ## Errors
    /// `InvalidTargetCount` for too small a count; the contour is unchanged.
    pub fn resample(&mut self, segments: usize) -> Result<(), ContourError> {
        self.simple = Some(self.derive_simple(segments, self.phase_shift, self.discrete_shift)?);
        Ok(())
    }

    fn require_segments(&self) -> Result<usize, ContourError> {
        self.segments().ok_or(ContourError::NotResampled)
    }

    pub fn set_phase_shift(&mut self, phase_shift: Real) -> Result<(), ContourError> {
        let segments = self.require_segments()?;
        self.simple = Some(self.derive_simple(segments, phase_shift, self.discrete_shift)?);
        self.phase_shift = phase_shift;
        Ok(())
    }

    /// Set the index rotation. Open paths keep a zero shift.
    pub fn set_discrete_shift(&mut self, shift: isize) -> Result<(), ContourError> {
        let segments = self.require_segments()?;
        let shift = if self.is_cyclic() {
            shift.rem_euclid(segments as isize)
        } else {
            0
        };
        self.simple = Some(self.derive_simple(segments, self.phase_shift, shift)?);
        self.discrete_shift = shift;
        Ok(())
    }

    /// Reverse the traversal direction of both point sets.
    ///
    /// Loops keep their first raw point, so negating both shifts reverses the
    /// resampled points in place as well.
    pub fn reverse(&mut self) -> Result<(), ContourError> {
        self.raw = self.raw.reversed();
        self.phase_shift = -self.phase_shift;
        self.discrete_shift = match self.segments() {
            Some(n) if self.is_cyclic() => (-self.discrete_shift).rem_euclid(n as isize),
            _ => -self.discrete_shift,
        };
        if let Some(segments) = self.segments() {
            self.simple = Some(self.derive_simple(segments, self.phase_shift, self.discrete_shift)?);
        }
        Ok(())
    }

    /// Cache the center of mass of the resampled points.
    pub fn update_com(&mut self) -> Option<Point3<Real>> {
        self.com = self.simple.as_ref().map(Polyline::center_of_mass);
        self.com
    }

    /// Local frame spanned by resampled point `n`: `y` points from the center
    /// of mass to it and `x = y × normal`. Uses the cached center of mass when
    /// [`Contour::update_com`] has run, otherwise computes it on the fly.
    ///
    /// ## Errors
    /// - `NotResampled`, or `TooFewPoints` when `n` is out of range
    /// - `DegenerateGeometry` without a plane or when point `n` sits on the
    ///   center of mass or on the normal axis
    pub fn derive_axes(&self, n: usize) -> Result<(Unit<Vector3<Real>>, Unit<Vector3<Real>>), ContourError> {
        let simple = self.simple()?;
        if n >= simple.len() {
            return Err(ContourError::TooFewPoints {
                required: n + 1,
                found: simple.len(),
            });
        }
        let point = simple.points()[n];
        let normal = self
            .plane
            .as_ref()
            .map(|plane| plane.normal)
            .ok_or_else(|| ContourError::DegenerateGeometry("contour has no plane".into()))?;
        let com = self.com.unwrap_or_else(|| simple.center_of_mass());

        let y = Unit::try_new(point - com, tolerance()).ok_or_else(|| {
            ContourError::DegenerateGeometry(format!("point {n} coincides with the center of mass"))
        })?;
        let x = Unit::try_new(y.cross(&normal.into_inner()), tolerance()).ok_or_else(|| {
            ContourError::DegenerateGeometry(format!("point {n} lies on the plane normal"))
        })?;
        Ok((x, y))
    }

    /// Any orthonormal `(x, y)` frame in the contour plane.
    pub fn generic_axes(&self) -> Option<(Unit<Vector3<Real>>, Unit<Vector3<Real>>)> {
        self.plane.as_ref().map(Plane::generic_axes)
    }

    /// Re-estimate the plane normal from the surface normals under the
    /// resampled points, keeping the side the old normal pointed to.
    ///
    /// ## Errors
    /// `NotResampled`, or `DegenerateGeometry` without a plane or when the
    /// surface normals do not define a plane.
    pub fn fit_plane_to_surface(&mut self, surface: &dyn SurfaceProvider) -> Result<(), ContourError> {
        let simple = self.simple()?;
        let Some(plane) = self.plane else {
            return Err(ContourError::DegenerateGeometry("contour has no plane".into()));
        };
        let com = simple.center_of_mass();
        let tips: Vec<Point3<Real>> = simple
            .points()
            .iter()
            .filter_map(|p| surface.closest_point(p))
            .filter_map(|hit| Unit::try_new(hit.normal, tolerance()))
            .map(|normal| com + normal.into_inner())
            .collect();
        let (_, fitted) = best_fit_plane(&tips).ok_or_else(|| {
            ContourError::DegenerateGeometry("surface normals do not span a plane".into())
        })?;
        let mut normal = fitted.into_inner();
        if normal.dot(&plane.normal.into_inner()) < 0.0 {
            normal = -normal;
        }
        self.plane = Some(Plane::new(plane.point, normal)?);
        self.com = Some(com);
        Ok(())
    }

    /// Plane normal, or the best-fit normal of the resampled points.
    pub(crate) fn normal(&self) -> Result<Unit<Vector3<Real>>, ContourError> {
        if let Some(plane) = &self.plane {
            return Ok(plane.normal);
        }
        self.simple()?
            .best_fit_plane()
            .map(|(_, normal)| normal)
            .ok_or_else(|| ContourError::DegenerateGeometry("contour has no defined normal".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square(size: Real) -> Polyline {
        Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn simple_requires_resampling() {
        let mut contour = Contour::new(square(2.0));
        assert_eq!(contour.simple(), Err(ContourError::NotResampled));
        assert_eq!(contour.set_phase_shift(0.5), Err(ContourError::NotResampled));
        contour.resample(8).unwrap();
        assert_eq!(contour.segments(), Some(8));
    }

    #[test]
    fn shifts_rederive_from_raw() {
        let mut contour = Contour::new(square(2.0));
        contour.resample(8).unwrap();
        let base = contour.simple().unwrap().clone();

        contour.set_discrete_shift(3).unwrap();
        assert_eq!(contour.simple().unwrap(), &base.rotated(3));
        contour.set_discrete_shift(-1).unwrap();
        assert_eq!(contour.discrete_shift(), 7);

        contour.set_discrete_shift(0).unwrap();
        contour.set_phase_shift(0.5).unwrap();
        assert_relative_eq!(contour.simple().unwrap().first(), Point3::new(0.5, 0.0, 0.0));
        contour.set_phase_shift(0.0).unwrap();
        assert_eq!(contour.simple().unwrap(), &base);
    }

    #[test]
    fn reverse_reverses_resampled_points() {
        let mut contour = Contour::new(square(2.0));
        contour.resample(8).unwrap();
        contour.set_phase_shift(0.25).unwrap();
        contour.set_discrete_shift(2).unwrap();
        let before = contour.simple().unwrap().clone();

        contour.reverse().unwrap();
        assert_eq!(contour.discrete_shift(), 6);
        assert_relative_eq!(contour.phase_shift(), -0.25);
        let expected = before.reversed();
        for (a, b) in contour.simple().unwrap().points().iter().zip(expected.points()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }

        contour.reverse().unwrap();
        for (a, b) in contour.simple().unwrap().points().iter().zip(before.points()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn axes_from_point() {
        let plane = Plane::new(Point3::new(1.0, 1.0, 0.0), Vector3::z()).unwrap();
        let mut contour = Contour::with_plane(square(2.0), plane);
        contour.resample(4).unwrap();
        assert_eq!(contour.update_com(), Some(Point3::new(1.0, 1.0, 0.0)));

        let (x, y) = contour.derive_axes(1).unwrap();
        let s = (0.5 as Real).sqrt();
        assert_relative_eq!(y.into_inner(), Vector3::new(s, -s, 0.0), epsilon = 1e-9);
        assert_relative_eq!(x.into_inner(), Vector3::new(-s, -s, 0.0), epsilon = 1e-9);
        assert!(contour.derive_axes(4).is_err());

        let (gx, gy) = contour.generic_axes().unwrap();
        assert_relative_eq!(gx.cross(&gy.into_inner()), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn axes_leave_com_cache_alone() {
        let plane = Plane::new(Point3::new(1.0, 1.0, 0.0), Vector3::z()).unwrap();
        let mut contour = Contour::with_plane(square(2.0), plane);
        contour.resample(4).unwrap();
        let (_, y) = contour.derive_axes(0).unwrap();
        let s = (0.5 as Real).sqrt();
        assert_relative_eq!(y.into_inner(), Vector3::new(-s, -s, 0.0), epsilon = 1e-9);
        assert_eq!(contour.com(), None);
    }

    #[test]
    fn edges_decide_cyclicity() {
        let points = square(1.0).into_points();
        let contour = Contour::from_edges(points.clone(), &[(0, 1), (1, 2), (2, 3), (3, 0)]).unwrap();
        assert!(contour.is_cyclic());
        let contour = Contour::from_edges(points.clone(), &[(0, 1), (1, 2), (2, 3)]).unwrap();
        assert!(!contour.is_cyclic());

        // reversed orientation, same loop
        let contour = Contour::from_edges(points, &[(1, 0), (2, 1), (3, 2), (0, 3)]).unwrap();
        assert!(contour.is_cyclic());
        assert_eq!(contour.raw().len(), 4);
        assert_relative_eq!(contour.raw().length(), 4.0, epsilon = 1e-9);
    }
}
