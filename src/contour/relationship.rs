//! Spatial relationship between two neighboring contours, used to pick a
//! bridging strategy.

use super::Contour;
use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::polyline::approx_radius;
use nalgebra::{Point3, Unit, Vector3};

/// Measurements of `self` against `other`, in the "other → self" convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationshipReport {
    pub com_self: Point3<Real>,
    pub com_other: Point3<Real>,
    /// `com_self - com_other`.
    pub delta: Vector3<Real>,
    /// Normals after sign correction: `other_normal` points along `delta`,
    /// `self_normal` agrees with `other_normal`.
    pub self_normal: Unit<Vector3<Real>>,
    pub other_normal: Unit<Vector3<Real>>,
    /// `self_normal · other_normal`, in `[0, 1]`.
    pub parallelism: Real,
    pub average_normal: Unit<Vector3<Real>>,
    /// How directly each normal points along `delta`; 0 when the centers coincide.
    pub self_aims_other: Real,
    pub other_aims_self: Real,
    pub aiming_difference: Real,
    /// `self` is larger than `other`, i.e. the shape widens from other to self.
    pub divergent: bool,
    /// `sqrt(Δr² / (Δr² + |delta|²))`.
    pub divergence: Real,
}

impl Contour {
    /// Compare this contour with `other`.
    ///
    /// Normals come from each contour's plane, or from a best-fit plane
    /// through its resampled points.
    ///
    /// ## Errors
    /// `NotResampled`, or `DegenerateGeometry` when a contour has no normal.
    pub fn analyze_relationship(&self, other: &Self) -> Result<RelationshipReport, ContourError> {
        let (own, theirs) = (self.simple()?, other.simple()?);
        let com_self = own.center_of_mass();
        let com_other = theirs.center_of_mass();
        let delta = com_self - com_other;
        let axis = Unit::try_new(delta, tolerance()).map(Unit::into_inner);

        let mut other_normal = other.normal()?.into_inner();
        if axis.is_some_and(|axis| other_normal.dot(&axis) < 0.0) {
            other_normal = -other_normal;
        }
        let mut self_normal = self.normal()?.into_inner();
        if self_normal.dot(&other_normal) < 0.0 {
            self_normal = -self_normal;
        }

        let parallelism = self_normal.dot(&other_normal);
        let average_normal =
            Unit::try_new(self_normal + other_normal, tolerance()).unwrap_or(Unit::new_unchecked(self_normal));
        let (self_aims_other, other_aims_self) = match axis {
            Some(axis) => (self_normal.dot(&axis), other_normal.dot(&axis)),
            None => (0.0, 0.0),
        };

        let radius_self = approx_radius(own.points(), &com_self);
        let radius_other = approx_radius(theirs.points(), &com_other);
        let dr = radius_self - radius_other;
        let spread = dr * dr + delta.norm_squared();
        let divergence = if spread > 0.0 { (dr * dr / spread).sqrt() } else { 0.0 };
        log::debug!("parallelism {parallelism:.3}, divergence {divergence:.3}");

        Ok(RelationshipReport {
            com_self,
            com_other,
            delta,
            self_normal: Unit::new_unchecked(self_normal),
            other_normal: Unit::new_unchecked(other_normal),
            parallelism,
            average_normal,
            self_aims_other,
            other_aims_self,
            aiming_difference: self_aims_other - other_aims_self,
            divergent: dr > 0.0,
            divergence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use crate::polyline::Polyline;
    use approx::assert_relative_eq;

    fn ring(radius: Real, z: Real) -> Contour {
        let points = (0..12)
            .map(|i| {
                let a = crate::float_types::TAU * i as Real / 12.0;
                Point3::new(radius * a.cos(), radius * a.sin(), z)
            })
            .collect();
        let mut contour = Contour::new(Polyline::closed(points).unwrap());
        contour.resample(12).unwrap();
        contour
    }

    #[test]
    fn equal_rings_do_not_diverge() {
        let report = ring(1.0, 2.0).analyze_relationship(&ring(1.0, 0.0)).unwrap();
        assert_relative_eq!(report.delta, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-9);
        assert_relative_eq!(report.divergence, 0.0, epsilon = 1e-9);
        assert_relative_eq!(report.parallelism, 1.0, epsilon = 1e-9);
        assert_relative_eq!(report.self_aims_other, 1.0, epsilon = 1e-9);
        assert_relative_eq!(report.aiming_difference, 0.0, epsilon = 1e-9);
        assert_relative_eq!(report.other_normal.into_inner(), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn widening_ring_diverges() {
        let report = ring(2.0, 1.0).analyze_relationship(&ring(1.0, 0.0)).unwrap();
        assert!(report.divergent);
        assert!(report.divergence > 0.0 && report.divergence < 1.0);
        // Δr == |delta|
        assert_relative_eq!(report.divergence, (0.5 as Real).sqrt(), epsilon = 1e-9);

        let reverse = ring(1.0, 0.0).analyze_relationship(&ring(2.0, 1.0)).unwrap();
        assert!(!reverse.divergent);
        assert_relative_eq!(reverse.divergence, report.divergence, epsilon = 1e-9);
    }

    #[test]
    fn normals_follow_the_center_line() {
        // plane normals given pointing against delta
        let down = Plane::new(Point3::origin(), -Vector3::z()).unwrap();
        let mut upper = ring(1.0, 1.0);
        upper.set_plane(down);
        let mut lower = ring(1.0, 0.0);
        lower.set_plane(down);
        let report = upper.analyze_relationship(&lower).unwrap();
        assert_relative_eq!(report.other_normal.into_inner(), Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(report.self_normal.into_inner(), Vector3::z(), epsilon = 1e-9);
        assert_relative_eq!(report.average_normal.into_inner(), Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn requires_resampled_points() {
        let raw = Contour::new(ring(1.0, 0.0).raw().clone());
        assert_eq!(
            raw.analyze_relationship(&ring(1.0, 1.0)),
            Err(ContourError::NotResampled)
        );
    }
}
