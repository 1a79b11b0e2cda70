//! Ordered point sequences, open or closed, and the measurements the contour
//! algorithms take on them.

use crate::errors::ContourError;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb, tolerance};
use nalgebra::{Matrix3, Point3, SymmetricEigen, Unit, Vector3};

/// A pair of point indices joined by a straight edge.
pub type Edge = (usize, usize);

/// Ordered sequence of points. When `cyclic`, the last point implicitly
/// connects back to the first.
///
/// Construction enforces at least 3 points for closed loops and 2 for open paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point3<Real>>,
    cyclic: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point3<Real>>, cyclic: bool) -> Result<Self, ContourError> {
        let required = Self::min_points(cyclic);
        if points.len() < required {
            return Err(ContourError::TooFewPoints {
                required,
                found: points.len(),
            });
        }
        Ok(Self { points, cyclic })
    }

    /// Build an open path.
    pub fn open(points: Vec<Point3<Real>>) -> Result<Self, ContourError> {
        Self::new(points, false)
    }

    /// Build a closed loop.
    pub fn closed(points: Vec<Point3<Real>>) -> Result<Self, ContourError> {
        Self::new(points, true)
    }

    pub const fn min_points(cyclic: bool) -> usize {
        if cyclic { 3 } else { 2 }
    }

    #[inline]
    pub fn points(&self) -> &[Point3<Real>] {
        &self.points
    }

    /// Mutable access to the coordinates. The point count cannot change.
    #[inline]
    pub fn points_mut(&mut self) -> &mut [Point3<Real>] {
        &mut self.points
    }

    pub fn into_points(self) -> Vec<Point3<Real>> {
        self.points
    }

    #[inline]
    pub const fn is_cyclic(&self) -> bool {
        self.cyclic
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a valid polyline holds at least two points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Point3<Real> {
        self.points[0]
    }

    pub fn last(&self) -> Point3<Real> {
        self.points[self.points.len() - 1]
    }

    /// Consecutive connectivity, plus the closing edge for loops.
    pub fn edges(&self) -> Vec<Edge> {
        chain_edges(self.points.len(), self.cyclic)
    }

    /// Iterate every edge as a pair of end points.
    pub fn segments(&self) -> impl Iterator<Item = (Point3<Real>, Point3<Real>)> + '_ {
        let n = self.points.len();
        let count = if self.cyclic { n } else { n - 1 };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Total arc length, including the closing edge of a loop.
    pub fn length(&self) -> Real {
        self.segments().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Arc length reached at each point, starting at 0.
    ///
    /// For loops one extra entry holds the full perimeter (arrival back at point 0).
    pub fn cumulative_lengths(&self) -> Vec<Real> {
        let mut lengths = Vec::with_capacity(self.points.len() + 1);
        let mut total = 0.0;
        lengths.push(total);
        for (a, b) in self.segments() {
            total += (b - a).norm();
            lengths.push(total);
        }
        lengths
    }

    pub fn center_of_mass(&self) -> Point3<Real> {
        center_of_mass(&self.points)
    }

    /// Mean distance of the points from their center of mass.
    pub fn approx_radius(&self) -> Real {
        approx_radius(&self.points, &self.center_of_mass())
    }

    pub fn bounding_box(&self) -> Aabb {
        bounding_box(&self.points)
    }

    /// Length of the bounding box diagonal.
    pub fn bounding_diagonal(&self) -> Real {
        let aabb = self.bounding_box();
        (aabb.maxs - aabb.mins).norm()
    }

    /// The same path traversed in the opposite direction.
    ///
    /// Open paths are fully reversed. Loops keep their first point so the arc
    /// length origin does not move: `[p0, p1, .., pn]` becomes `[p0, pn, .., p1]`.
    pub fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        if self.cyclic {
            points[1..].reverse();
        } else {
            points.reverse();
        }
        Self {
            points,
            cyclic: self.cyclic,
        }
    }

    /// Start the point sequence at index `shift` (negative values count back from the end).
    pub fn rotated(&self, shift: isize) -> Self {
        Self {
            points: rotate_left(&self.points, shift),
            cyclic: self.cyclic,
        }
    }

    /// Area-weighted normal of the loop (Newell's method), or `None` when the
    /// points enclose no area.
    pub fn newell_normal(&self) -> Option<Unit<Vector3<Real>>> {
        newell_normal(&self.points)
    }

    /// Least-squares plane through the points: center of mass and the
    /// direction of least variance.
    pub fn best_fit_plane(&self) -> Option<(Point3<Real>, Unit<Vector3<Real>>)> {
        best_fit_plane(&self.points)
    }
}

/// Edge list `(i, i + 1)` for a chain of `count` points, closed with `(count - 1, 0)` when cyclic.
pub fn chain_edges(count: usize, cyclic: bool) -> Vec<Edge> {
    if count < 2 {
        return Vec::new();
    }
    let mut edges: Vec<Edge> = (0..count - 1).map(|i| (i, i + 1)).collect();
    if cyclic && count > 2 {
        edges.push((count - 1, 0));
    }
    edges
}

/// `out[i] = items[(i + shift) mod n]`.
pub fn rotate_left<T: Clone>(items: &[T], shift: isize) -> Vec<T> {
    let n = items.len();
    if n == 0 {
        return Vec::new();
    }
    let k = shift.rem_euclid(n as isize) as usize;
    let mut out = Vec::with_capacity(n);
    out.extend_from_slice(&items[k..]);
    out.extend_from_slice(&items[..k]);
    out
}

pub fn center_of_mass(points: &[Point3<Real>]) -> Point3<Real> {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum: Vector3<Real> = points.iter().map(|p| p.coords).sum();
    Point3::from(sum / points.len() as Real)
}

pub fn approx_radius(points: &[Point3<Real>], center: &Point3<Real>) -> Real {
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| (p - center).norm()).sum::<Real>() / points.len() as Real
}

pub fn bounding_box(points: &[Point3<Real>]) -> Aabb {
    let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
    let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
    for p in points {
        mins = mins.inf(p);
        maxs = maxs.sup(p);
    }
    if points.is_empty() {
        mins = Point3::origin();
        maxs = Point3::origin();
    }
    Aabb::new(mins, maxs)
}

pub fn newell_normal(points: &[Point3<Real>]) -> Option<Unit<Vector3<Real>>> {
    let n = points.len();
    if n < 3 {
        return None;
    }
    let mut normal = Vector3::zeros();
    for i in 0..n {
        let current = points[i];
        let next = points[(i + 1) % n];
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }
    Unit::try_new(normal, tolerance())
}

pub fn best_fit_plane(points: &[Point3<Real>]) -> Option<(Point3<Real>, Unit<Vector3<Real>>)> {
    if points.len() < 3 {
        return None;
    }
    let center = center_of_mass(points);
    let mut covariance = Matrix3::zeros();
    for p in points {
        let d = p - center;
        covariance += d * d.transpose();
    }
    let eigen = SymmetricEigen::new(covariance);
    let (smallest, _) = eigen
        .eigenvalues
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))?;
    let normal = eigen.eigenvectors.column(smallest).into_owned();
    Unit::try_new(normal, tolerance()).map(|normal| (center, normal))
}
