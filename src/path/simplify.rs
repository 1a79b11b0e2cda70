//! Ramer–Douglas–Peucker feature detection.

use crate::float_types::{Real, tolerance};
use nalgebra::Point3;

/// Ascending, duplicate-free indices into a point sequence marking its
/// feature points. Always starts at 0 and ends at the last index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KnotSet(Vec<usize>);

impl KnotSet {
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Knots other than the two end points.
    pub fn interior(&self) -> &[usize] {
        if self.0.len() <= 2 {
            &[]
        } else {
            &self.0[1..self.0.len() - 1]
        }
    }

    /// Consecutive `(start, end)` index pairs bounding each feature-free run.
    pub fn spans(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Distance from `p` to the segment `a..b` (to `a` when the segment is degenerate).
pub fn distance_to_segment(p: &Point3<Real>, a: &Point3<Real>, b: &Point3<Real>) -> Real {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < tolerance() * tolerance() {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Detect the corners of `points`: every index the Ramer–Douglas–Peucker
/// recursion keeps at `error_tolerance`.
///
/// The tolerance is usually `bounding_diagonal / feature_factor`, see
/// [`ContourConfig::feature_tolerance`](crate::config::ContourConfig::feature_tolerance).
pub fn simplify(points: &[Point3<Real>], error_tolerance: Real) -> KnotSet {
    match points.len() {
        0 => KnotSet(Vec::new()),
        1 => KnotSet(vec![0]),
        2 => KnotSet(vec![0, 1]),
        n => {
            let mut keep = vec![false; n];
            keep[0] = true;
            keep[n - 1] = true;
            // explicit stack instead of recursion so long strokes cannot overflow
            let mut stack = vec![(0, n - 1)];
            while let Some((first, last)) = stack.pop() {
                if last <= first + 1 {
                    continue;
                }
                let (a, b) = (points[first], points[last]);
                let (index, distance) = (first + 1..last)
                    .map(|i| (i, distance_to_segment(&points[i], &a, &b)))
                    .fold((first, -1.0), |best, candidate| {
                        if candidate.1 > best.1 { candidate } else { best }
                    });
                if distance > error_tolerance {
                    keep[index] = true;
                    stack.push((first, index));
                    stack.push((index, last));
                }
            }
            KnotSet(
                keep.iter()
                    .enumerate()
                    .filter_map(|(i, &k)| k.then_some(i))
                    .collect(),
            )
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn straight_line_keeps_endpoints() {
        let points: Vec<_> = (0..10).map(|i| Point3::new(i as Real, 0.0, 0.0)).collect();
        let knots = simplify(&points, 0.01);
        assert_eq!(knots.indices(), &[0, 9]);
        assert!(knots.interior().is_empty());
    }

    #[test]
    fn corner_is_detected() {
        let mut points: Vec<_> = (0..=5).map(|i| Point3::new(i as Real, 0.0, 0.0)).collect();
        points.extend((1..=5).map(|i| Point3::new(5.0, i as Real, 0.0)));
        let knots = simplify(&points, 0.1);
        assert_eq!(knots.indices(), &[0, 5, 10]);
        assert_eq!(knots.spans().collect::<Vec<_>>(), vec![(0, 5), (5, 10)]);
    }

    #[test]
    fn short_inputs() {
        assert!(simplify(&[], 1.0).is_empty());
        assert_eq!(simplify(&[Point3::origin()], 1.0).indices(), &[0]);
        let two = [Point3::origin(), Point3::new(1.0, 1.0, 1.0)];
        assert_eq!(simplify(&two, 1.0).indices(), &[0, 1]);
    }

    #[test]
    fn closed_stroke_with_coincident_ends() {
        // start and end coincide, so distances fall back to the start point
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ];
        let knots = simplify(&points, 0.8);
        assert_eq!(knots.indices(), &[0, 2, 3]);
    }
}
