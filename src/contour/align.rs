//! Point correspondence between two contours: winding direction, whole
//! segment rotation and sub-segment phase.

use super::Contour;
use crate::errors::ContourError;
use crate::float_types::{Real, tolerance};
use crate::polyline::{center_of_mass, newell_normal};
use nalgebra::{Point3, Unit, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Fixed number of interval narrowing steps in the phase search.
pub const PHASE_SEARCH_ITERATIONS: usize = 20;

/// What [`Contour::align`] changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentReport {
    /// The contour's direction was flipped to match the other one.
    pub reversed: bool,
    pub discrete_shift: isize,
    pub phase_shift: Real,
    /// [`connectivity_quality`] before and after aligning.
    pub quality_before: Real,
    pub quality_after: Real,
}

/// How well same-index points of `a` and `b` bridge across: the mean of
/// `|ĉᵢ · d̂|` where `cᵢ = a[i] - b[i]` and `d` joins the two centers of mass.
///
/// 1 means every connector runs along the center line. Zero-length
/// connectors are skipped; coincident centers give 0.
pub fn connectivity_quality(a: &[Point3<Real>], b: &[Point3<Real>]) -> Real {
    let Some(direction) =
        Unit::try_new(center_of_mass(a) - center_of_mass(b), tolerance()).map(Unit::into_inner)
    else {
        return 0.0;
    };
    let (sum, count) = a
        .iter()
        .zip(b)
        .filter_map(|(p, q)| Unit::try_new(p - q, tolerance()))
        .fold((0.0, 0usize), |(sum, count), connector| {
            (sum + connector.dot(&direction).abs(), count + 1)
        });
    if count < a.len() {
        log::debug!("skipped {} zero length connectors", a.len() - count);
    }
    if count == 0 { 0.0 } else { sum / count as Real }
}

/// Signed winding of a loop around `axis`: the sum of the turns between
/// consecutive unit edge directions, projected on `axis`.
pub fn discrete_curl(points: &[Point3<Real>], axis: &Vector3<Real>) -> Real {
    let n = points.len();
    let directions: Vec<Vector3<Real>> = (0..n)
        .filter_map(|i| Unit::try_new(points[(i + 1) % n] - points[i], tolerance()))
        .map(Unit::into_inner)
        .collect();
    let m = directions.len();
    (0..m)
        .map(|i| directions[i].cross(&directions[(i + 1) % m]).dot(axis))
        .sum()
}

/// Normal of the corner at the first three points, or of the whole loop
/// when they are collinear.
fn leading_normal(points: &[Point3<Real>]) -> Option<Vector3<Real>> {
    let corner = (points[1] - points[0]).cross(&(points[2] - points[1]));
    Unit::try_new(corner, tolerance())
        .or_else(|| newell_normal(points))
        .map(Unit::into_inner)
}

/// Common direction to measure both loops' curl against.
fn curl_axis(a: &[Point3<Real>], b: &[Point3<Real>]) -> Result<Vector3<Real>, ContourError> {
    let degenerate = || ContourError::DegenerateGeometry("loop has no winding direction".into());
    let na = leading_normal(a).ok_or_else(degenerate)?;
    let mut nb = leading_normal(b).ok_or_else(degenerate)?;
    if na.dot(&nb) < 0.0 {
        nb = -nb;
    }
    Ok((na + nb).normalize())
}

/// `m[i][j] = |a[j] - b[i]|`.
fn distance_matrix(a: &[Point3<Real>], b: &[Point3<Real>]) -> Vec<Vec<Real>> {
    let row = |q: &Point3<Real>| a.iter().map(|p| (p - q).norm()).collect::<Vec<_>>();

    #[cfg(feature = "parallel")]
    let rows = b.par_iter().map(row).collect();

    #[cfg(not(feature = "parallel"))]
    let rows = b.iter().map(row).collect();

    rows
}

/// Rotation `s` of `a` minimizing `Σ |a[(i + s) mod n] - b[i]|`; the first
/// minimum wins ties.
pub fn best_discrete_shift(a: &[Point3<Real>], b: &[Point3<Real>]) -> usize {
    let n = a.len();
    let distances = distance_matrix(a, b);
    let cost = |shift: usize| -> Real { (0..n).map(|i| distances[i][(i + shift) % n]).sum() };
    (0..n)
        .map(|shift| (shift, cost(shift)))
        .fold((0, Real::MAX), |best, candidate| {
            if candidate.1 < best.1 { candidate } else { best }
        })
        .0
}

impl Contour {
    /// [`connectivity_quality`] of this contour's resampled points against `other`'s.
    ///
    /// ## Errors
    /// `NotResampled`, or `MismatchedSegmentCount` when the point counts differ.
    pub fn connectivity_quality(&self, other: &Self) -> Result<Real, ContourError> {
        let (a, b) = (self.simple()?, other.simple()?);
        if a.len() != b.len() {
            return Err(ContourError::MismatchedSegmentCount {
                expected: b.len(),
                found: a.len(),
            });
        }
        Ok(connectivity_quality(a.points(), b.points()))
    }

    /// Reorder this contour's resampled points so they pair up with `other`'s.
    ///
    /// 1. Direction: loops compare curl around a shared axis, open paths the
    ///    dot product of their head-to-tail vectors. On disagreement this
    ///    contour is reversed.
    /// 2. Unless `direction_only`: with `auto_align` both shifts are first reset
    ///    to zero, then loops take the index rotation with the least total
    ///    connector length.
    /// 3. With `auto_align` on loops: the phase in `[-1, 1]` is searched for
    ///    the best [`connectivity_quality`] by
    ///    [`PHASE_SEARCH_ITERATIONS`] steps of interval narrowing, and the best
    ///    phase evaluated is kept.
    ///
    /// `other` is never modified. An already aligned pair is a fixed point.
    ///
    /// ## Errors
    /// `NotResampled`, `MismatchedSegmentCount`, `CyclicityMismatch`,
    /// `TooFewPoints` for loops under three points, or `DegenerateGeometry`
    /// when a loop has no winding direction. Nothing is modified on error.
    pub fn align(
        &mut self,
        other: &Self,
        auto_align: bool,
        direction_only: bool,
    ) -> Result<AlignmentReport, ContourError> {
        let segments = self.simple()?.len();
        let target = other.simple()?;
        if segments != target.len() {
            return Err(ContourError::MismatchedSegmentCount {
                expected: target.len(),
                found: segments,
            });
        }
        if self.is_cyclic() != other.is_cyclic() {
            return Err(ContourError::CyclicityMismatch);
        }
        let cyclic = self.is_cyclic();
        if cyclic && segments < 3 {
            return Err(ContourError::TooFewPoints {
                required: 3,
                found: segments,
            });
        }
        let target = target.points();
        let quality_before = connectivity_quality(self.simple()?.points(), target);

        // every step below works on a copy so a failure leaves `self` untouched
        let mut work = self.clone();
        let own = work.simple()?.points().to_vec();

        let reversed = if cyclic {
            let axis = curl_axis(target, &own)?;
            let (curl_other, curl_self) = (discrete_curl(target, &axis), discrete_curl(&own, &axis));
            if curl_other * curl_self < 0.0 {
                log::info!("reversing contour direction (curl {curl_self:.3} against {curl_other:.3})");
                true
            } else {
                false
            }
        } else {
            let span_other = target[target.len() - 1] - target[0];
            let span_self = own[own.len() - 1] - own[0];
            if span_other.dot(&span_self) < 0.0 {
                log::info!("reversing path direction");
                true
            } else {
                false
            }
        };
        if reversed {
            work.reverse()?;
        }

        if !direction_only {
            if auto_align {
                work.phase_shift = 0.0;
                work.discrete_shift = 0;
                work.resample(segments)?;
            }

            if cyclic {
                let shift = best_discrete_shift(work.simple()?.points(), target);
                if shift != 0 {
                    log::debug!(
                        "rough shift by {shift} segments, quality before {:.4}",
                        connectivity_quality(work.simple()?.points(), target)
                    );
                    work.set_discrete_shift(work.discrete_shift + shift as isize)?;
                }
            }

            if auto_align && cyclic {
                let phase = work.search_phase(segments, target)?;
                work.set_phase_shift(phase)?;
            }
        }

        let quality_after = connectivity_quality(work.simple()?.points(), target);
        log::info!(
            "alignment quality {quality_before:.4} -> {quality_after:.4} (shift {}, phase {:.4})",
            work.discrete_shift,
            work.phase_shift
        );

        *self = work;
        Ok(AlignmentReport {
            reversed,
            discrete_shift: self.discrete_shift,
            phase_shift: self.phase_shift,
            quality_before,
            quality_after,
        })
    }

    /// Narrow `[left, right] = [-1, 1]` toward the higher scoring side for a
    /// fixed number of steps, scoring the middle and both bounds each step.
    /// Returns the best phase seen, starting from the current one.
    fn search_phase(&self, segments: usize, target: &[Point3<Real>]) -> Result<Real, ContourError> {
        let score = |phase: Real| -> Result<Real, ContourError> {
            let trial = self.derive_simple(segments, phase, self.discrete_shift)?;
            Ok(connectivity_quality(trial.points(), target))
        };

        let mut best = (self.phase_shift, score(self.phase_shift)?);
        let (mut left, mut right): (Real, Real) = (-1.0, 1.0);
        for _ in 0..PHASE_SEARCH_ITERATIONS {
            let width = right - left;
            let middle = 0.5 * (left + right);
            let (at_middle, at_left, at_right) = (score(middle)?, score(left)?, score(right)?);

            for candidate in [(middle, at_middle), (left, at_left), (right, at_right)] {
                if candidate.1 > best.1 {
                    best = candidate;
                }
            }

            if at_left < at_middle && at_right < at_middle {
                left += width / 8.0;
                right -= width / 8.0;
            } else if at_left > at_middle && at_right > at_middle {
                if at_right > at_left {
                    left = right - 0.75 * width;
                } else {
                    right = left + 0.75 * width;
                }
            } else if at_left < at_middle && at_right > at_middle {
                left += width / 4.0;
            } else if at_left > at_middle && at_right < at_middle {
                right -= width / 4.0;
            }
        }

        log::debug!("phase search settled on {:.4} with quality {:.4}", best.0, best.1);
        Ok(best.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::polyline::Polyline;
    use approx::assert_relative_eq;

    fn circle(count: usize, radius: Real, z: Real, start: Real) -> Vec<Point3<Real>> {
        (0..count)
            .map(|i| {
                let a = start + crate::float_types::TAU * i as Real / count as Real;
                Point3::new(radius * a.cos(), radius * a.sin(), z)
            })
            .collect()
    }

    fn loop_contour(points: Vec<Point3<Real>>, segments: usize) -> Contour {
        let mut contour = Contour::new(Polyline::closed(points).unwrap());
        contour.resample(segments).unwrap();
        contour
    }

    #[test]
    fn coincident_connectors_are_skipped() {
        let a = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        let b = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        // averaged over the two real connectors, not all three
        let quality = connectivity_quality(&a, &b);
        assert!(quality.is_finite());
        assert_relative_eq!(quality, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_loop_fails_untouched() {
        let flat = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let mut contour = loop_contour(flat, 4);
        contour.set_phase_shift(0.25).unwrap();
        let before = contour.clone();
        let other = loop_contour(circle(4, 1.0, 1.0, 0.0), 4);

        let result = contour.align(&other, true, false);
        assert!(matches!(result, Err(ContourError::DegenerateGeometry(_))));
        assert_eq!(contour, before);

        // the well-formed side cannot align to it either
        let mut other = other;
        let untouched = other.clone();
        assert!(matches!(
            other.align(&contour, true, false),
            Err(ContourError::DegenerateGeometry(_))
        ));
        assert_eq!(other, untouched);

        let mut point = loop_contour(vec![Point3::new(0.0, 0.0, 1.0); 4], 4);
        let before = point.clone();
        assert!(matches!(
            point.align(&untouched, false, true),
            Err(ContourError::DegenerateGeometry(_))
        ));
        assert_eq!(point, before);
    }

    #[test]
    fn quality_of_stacked_loops_is_one() {
        let a = circle(8, 1.0, 1.0, 0.0);
        let b = circle(8, 1.0, 0.0, 0.0);
        assert_relative_eq!(connectivity_quality(&a, &b), 1.0, epsilon = 1e-9);
        // coincident centers
        assert_eq!(connectivity_quality(&b, &b), 0.0);
    }

    #[test]
    fn curl_sign_follows_winding() {
        let ccw = circle(6, 1.0, 0.0, 0.0);
        let mut cw = ccw.clone();
        cw.reverse();
        assert!(discrete_curl(&ccw, &Vector3::z()) > 0.0);
        assert!(discrete_curl(&cw, &Vector3::z()) < 0.0);
    }

    #[test]
    fn discrete_shift_recovers_rotation() {
        let b = circle(10, 1.0, 0.0, 0.0);
        let a = crate::polyline::rotate_left(&circle(10, 1.0, 1.0, 0.0), 7);
        // a[(i + 3) mod 10] sits over b[i]
        assert_eq!(best_discrete_shift(&a, &b), 3);
    }

    #[test]
    fn mismatched_counts_leave_contour_untouched() {
        let mut a = loop_contour(circle(8, 1.0, 1.0, 0.0), 8);
        let b = loop_contour(circle(8, 1.0, 0.0, 0.0), 6);
        let before = a.clone();
        assert_eq!(
            a.align(&b, true, false),
            Err(ContourError::MismatchedSegmentCount {
                expected: 6,
                found: 8
            })
        );
        assert_eq!(a, before);
    }

    #[test]
    fn open_and_closed_do_not_align() {
        let mut open = Contour::new(Polyline::open(circle(8, 1.0, 1.0, 0.0)).unwrap());
        open.resample(8).unwrap();
        let closed = loop_contour(circle(8, 1.0, 0.0, 0.0), 8);
        assert_eq!(open.align(&closed, true, false), Err(ContourError::CyclicityMismatch));
    }

    #[test]
    fn opposite_winding_is_reversed() {
        let mut points = circle(8, 1.0, 1.0, 0.0);
        points[1..].reverse();
        let mut a = loop_contour(points, 8);
        let b = loop_contour(circle(8, 1.0, 0.0, 0.0), 8);
        let report = a.align(&b, false, true).unwrap();
        assert!(report.reversed);
        let own = a.simple().unwrap().points().to_vec();
        assert!(discrete_curl(&own, &Vector3::z()) > 0.0);
    }

    #[test]
    fn open_paths_follow_direction() {
        let line = |from: Real, to: Real, y: Real| {
            let mut contour = Contour::new(
                Polyline::open(vec![Point3::new(from, y, 0.0), Point3::new(to, y, 0.0)]).unwrap(),
            );
            contour.resample(5).unwrap();
            contour
        };
        let mut a = line(4.0, 0.0, 1.0);
        let b = line(0.0, 4.0, 0.0);
        let report = a.align(&b, true, false).unwrap();
        assert!(report.reversed);
        assert_eq!(report.discrete_shift, 0);
        assert_eq!(a.simple().unwrap().first(), Point3::new(0.0, 1.0, 0.0));
        assert_relative_eq!(report.quality_after, 1.0, epsilon = 1e-9);
    }
}
