//! Cutting planes.

use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use nalgebra::{Point3, Unit, Vector3};

/// A plane given by a point on it and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub point: Point3<Real>,
    pub normal: Unit<Vector3<Real>>,
}

impl Plane {
    /// Create a plane, normalizing `normal`.
    pub fn new(point: Point3<Real>, normal: Vector3<Real>) -> Result<Self, ContourError> {
        let normal = Unit::try_new(normal, tolerance()).ok_or_else(|| {
            ContourError::DegenerateGeometry(format!("plane normal at {point} has zero length"))
        })?;
        Ok(Self { point, normal })
    }

    /// Signed distance of `p` along the normal.
    #[inline]
    pub fn signed_distance(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&(p - self.point))
    }

    /// Same plane, opposite orientation.
    pub fn flipped(&self) -> Self {
        Self {
            point: self.point,
            normal: -self.normal,
        }
    }

    /// An arbitrary orthonormal `(x, y)` frame lying in the plane, with `x × y = normal`.
    pub fn generic_axes(&self) -> (Unit<Vector3<Real>>, Unit<Vector3<Real>>) {
        let n = self.normal.into_inner();
        // pick the world axis least aligned with the normal
        let helper = if n.x.abs() < 0.9 {
            Vector3::x()
        } else {
            Vector3::y()
        };
        let y = Unit::new_normalize(n.cross(&helper));
        let x = Unit::new_normalize(y.cross(&n));
        (x, y)
    }
}
