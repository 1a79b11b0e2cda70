//! Test support library
//! Shape builders and float helpers shared by the integration tests.

#![allow(dead_code)]

use nalgebra::Point3;
use retopo_contours::{
    Contour, ContourError, Polyline, TriMeshSurface,
    float_types::{Real, TAU},
};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned square loop `[0, size]²` at height `z`, counter-clockwise seen from +z.
pub fn square(size: Real, z: Real) -> Vec<Point3<Real>> {
    vec![
        Point3::new(0.0, 0.0, z),
        Point3::new(size, 0.0, z),
        Point3::new(size, size, z),
        Point3::new(0.0, size, z),
    ]
}

/// `count` points on a circle around the z axis, counter-clockwise from angle `start`.
pub fn ring(count: usize, radius: Real, z: Real, start: Real) -> Vec<Point3<Real>> {
    (0..count)
        .map(|i| {
            let a = start + TAU * i as Real / count as Real;
            Point3::new(radius * a.cos(), radius * a.sin(), z)
        })
        .collect()
}

/// A closed contour over `points`, resampled to `segments` points.
pub fn loop_contour(points: Vec<Point3<Real>>, segments: usize) -> Contour {
    let mut contour = Contour::new(Polyline::closed(points).unwrap());
    contour.resample(segments).unwrap();
    contour
}

/// Sum of distances between same-index points.
pub fn connector_length(a: &[Point3<Real>], b: &[Point3<Real>]) -> Real {
    a.iter().zip(b).map(|(p, q)| (p - q).norm()).sum()
}

/// Closed cylinder around the z axis from `z = 0` to `height`.
///
/// Side quad `i` is made of faces `2i` and `2i + 1`; the caps follow.
pub fn cylinder(radius: Real, height: Real, sides: u32) -> Result<TriMeshSurface, ContourError> {
    let n = sides;
    let mut vertices = ring(n as usize, radius, 0.0, 0.0);
    vertices.extend(ring(n as usize, radius, height, 0.0));
    vertices.push(Point3::new(0.0, 0.0, 0.0));
    vertices.push(Point3::new(0.0, 0.0, height));

    let mut indices = Vec::with_capacity(4 * n as usize);
    for i in 0..n {
        let j = (i + 1) % n;
        indices.push([i, j, n + j]);
        indices.push([i, n + j, n + i]);
    }
    for i in 0..n {
        let j = (i + 1) % n;
        indices.push([2 * n, j, i]);
        indices.push([2 * n + 1, n + i, n + j]);
    }
    TriMeshSurface::new(vertices, indices)
}
