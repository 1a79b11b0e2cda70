//! Traits for the surface queries contours are built on.

use crate::float_types::Real;
use crate::plane::Plane;
use crate::polyline::{Edge, Polyline};
use nalgebra::{Point3, Vector3};

/// A point found on the surface, with the normal and the face it lies on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Point3<Real>,
    pub normal: Vector3<Real>,
    pub face: usize,
}

/// Nearest-point queries, the only thing path relaxation needs.
pub trait SurfaceProvider: Send + Sync {
    /// Closest point on the surface to `point`, or `None` when the surface is empty.
    fn closest_point(&self, point: &Point3<Real>) -> Option<SurfaceHit>;

    /// Snap every point of `points` in place, returning the hits that succeeded.
    ///
    /// Points without a hit are left where they were and reported as `None`.
    fn snap_points(&self, points: &mut [Point3<Real>]) -> Vec<Option<SurfaceHit>> {
        points
            .iter_mut()
            .map(|p| {
                let hit = self.closest_point(p);
                if let Some(hit) = hit {
                    *p = hit.point;
                }
                hit
            })
            .collect()
    }
}

/// The full set of surface queries used to build contours.
pub trait GeometryProvider: SurfaceProvider {
    /// First surface hit along the ray `origin + t * direction`, `t >= 0`.
    fn raycast(&self, origin: &Point3<Real>, direction: &Vector3<Real>) -> Option<SurfaceHit>;

    /// Ordered boundary of the surface cut by `plane`, starting from the
    /// connected piece that passes through `seed_face`.
    ///
    /// Returns the ordered points (closed when the cut wraps around) and their
    /// edge list, or `None` when `seed_face` does not cross the plane.
    fn cross_section(&self, plane: &Plane, seed_face: usize) -> Option<(Polyline, Vec<Edge>)>;
}
