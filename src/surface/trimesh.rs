//! Parry `TriMesh`-backed surface provider.

use super::traits::{GeometryProvider, SurfaceHit, SurfaceProvider};
use crate::errors::ContourError;
use crate::float_types::{
    Real,
    parry3d::{
        query::{PointQueryWithLocation, Ray, RayCast},
        shape::{FeatureId, TriMesh},
    },
    tolerance,
};
use crate::plane::Plane;
use crate::polyline::{Edge, Polyline, bounding_box, chain_edges};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

/// Canonical mesh edge: vertex indices, smaller first.
type EdgeKey = (u32, u32);

#[inline]
const fn edge_key(a: u32, b: u32) -> EdgeKey {
    if a < b { (a, b) } else { (b, a) }
}

/// A triangle mesh answering ray, nearest-point and cross-section queries.
#[derive(Clone)]
pub struct TriMeshSurface {
    mesh: TriMesh,
    /// Triangles sharing each mesh edge, used to walk cross-sections.
    edge_faces: HashMap<EdgeKey, Vec<u32>>,
}

impl std::fmt::Debug for TriMeshSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriMeshSurface")
            .field("vertices", &self.mesh.vertices().len())
            .field("triangles", &self.mesh.indices().len())
            .finish()
    }
}

impl TriMeshSurface {
    /// Build from raw vertices and triangle indices.
    ///
    /// ## Errors
    /// If Parry rejects the triangles (`TriMeshBuilderError`).
    pub fn new(vertices: Vec<Point3<Real>>, indices: Vec<[u32; 3]>) -> Result<Self, ContourError> {
        let mesh = TriMesh::new(vertices, indices)?;
        Ok(Self::from_trimesh(mesh))
    }

    pub fn from_trimesh(mesh: TriMesh) -> Self {
        let mut edge_faces: HashMap<EdgeKey, Vec<u32>> = HashMap::new();
        for (face, &[a, b, c]) in mesh.indices().iter().enumerate() {
            for (i, j) in [(a, b), (b, c), (c, a)] {
                edge_faces.entry(edge_key(i, j)).or_default().push(face as u32);
            }
        }
        Self { mesh, edge_faces }
    }

    pub const fn mesh(&self) -> &TriMesh {
        &self.mesh
    }

    pub fn num_faces(&self) -> usize {
        self.mesh.indices().len()
    }

    /// Length of the mesh bounding box diagonal.
    pub fn bounding_diagonal(&self) -> Real {
        let aabb = bounding_box(self.mesh.vertices());
        (aabb.maxs - aabb.mins).norm()
    }

    /// Geometric normal of a face, or zero for a degenerate triangle.
    pub fn face_normal(&self, face: usize) -> Vector3<Real> {
        self.mesh
            .triangle(face as u32)
            .normal()
            .map(|n| n.into_inner())
            .unwrap_or_else(Vector3::zeros)
    }

    /// Back-face hits are reported by Parry as `face + num_faces`.
    fn face_from_feature(&self, feature: FeatureId) -> Option<usize> {
        match feature {
            FeatureId::Face(id) => Some(id as usize % self.num_faces().max(1)),
            _ => None,
        }
    }

    /// The two mesh edges of `face` that change side with respect to `above`.
    fn crossing_edges(&self, face: usize, above: &[bool]) -> Option<[EdgeKey; 2]> {
        let [a, b, c] = self.mesh.indices()[face];
        let mut found = [edge_key(a, b); 2];
        let mut count = 0;
        for (i, j) in [(a, b), (b, c), (c, a)] {
            if above[i as usize] != above[j as usize] {
                if count == 2 {
                    return None;
                }
                found[count] = edge_key(i, j);
                count += 1;
            }
        }
        (count == 2).then_some(found)
    }

    /// Follow the cut across `edge` into the face on the other side of `from_face`.
    fn step(&self, edge: EdgeKey, from_face: usize, above: &[bool]) -> Option<(usize, EdgeKey)> {
        let faces = self.edge_faces.get(&edge)?;
        faces
            .iter()
            .map(|&f| f as usize)
            .filter(|&f| f != from_face)
            .find_map(|f| {
                let [e0, e1] = self.crossing_edges(f, above)?;
                Some((f, if e0 == edge { e1 } else { e0 }))
            })
    }

    /// Walk from `edge`, leaving `face`, until the chain closes on `stop` or hits a boundary.
    /// Returns the visited edges and whether the walk closed.
    fn walk(
        &self,
        mut edge: EdgeKey,
        mut face: usize,
        stop: EdgeKey,
        above: &[bool],
    ) -> (Vec<EdgeKey>, bool) {
        let mut visited = Vec::new();
        for _ in 0..self.num_faces() {
            match self.step(edge, face, above) {
                Some((_, next)) if next == stop => return (visited, true),
                Some((next_face, next)) => {
                    visited.push(next);
                    edge = next;
                    face = next_face;
                },
                None => break,
            }
        }
        (visited, false)
    }

    fn edge_point(&self, edge: EdgeKey, plane: &Plane) -> Point3<Real> {
        let vertices = self.mesh.vertices();
        let a = vertices[edge.0 as usize];
        let b = vertices[edge.1 as usize];
        let da = plane.signed_distance(&a);
        let db = plane.signed_distance(&b);
        let denom = da - db;
        if denom.abs() < tolerance() {
            return a;
        }
        a + (b - a) * (da / denom)
    }
}

impl SurfaceProvider for TriMeshSurface {
    fn closest_point(&self, point: &Point3<Real>) -> Option<SurfaceHit> {
        if self.num_faces() == 0 {
            return None;
        }
        let (projection, (face, _)) = self.mesh.project_local_point_and_get_location(point, false);
        let face = face as usize;
        Some(SurfaceHit {
            point: projection.point,
            normal: self.face_normal(face),
            face,
        })
    }
}

impl GeometryProvider for TriMeshSurface {
    fn raycast(&self, origin: &Point3<Real>, direction: &Vector3<Real>) -> Option<SurfaceHit> {
        let ray = Ray::new(*origin, *direction);
        let hit = self.mesh.cast_local_ray_and_get_normal(&ray, Real::MAX, false)?;
        let face = self.face_from_feature(hit.feature)?;
        Some(SurfaceHit {
            point: ray.point_at(hit.time_of_impact),
            normal: self.face_normal(face),
            face,
        })
    }

    fn cross_section(&self, plane: &Plane, seed_face: usize) -> Option<(Polyline, Vec<Edge>)> {
        if seed_face >= self.num_faces() {
            return None;
        }
        let above: Vec<bool> = self
            .mesh
            .vertices()
            .iter()
            .map(|v| plane.signed_distance(v) >= 0.0)
            .collect();

        let [start, second] = self.crossing_edges(seed_face, &above)?;
        let (forward, closed) = self.walk(second, seed_face, start, &above);

        let mut chain = Vec::with_capacity(forward.len() + 2);
        if closed {
            chain.push(start);
            chain.push(second);
            chain.extend(forward);
        } else {
            let (mut backward, _) = self.walk(start, seed_face, second, &above);
            backward.reverse();
            chain.extend(backward);
            chain.push(start);
            chain.push(second);
            chain.extend(forward);
        }

        // a plane through a mesh vertex yields the same point from both edges meeting there
        let eps = tolerance();
        let mut points: Vec<Point3<Real>> = Vec::with_capacity(chain.len());
        for edge in chain {
            let p = self.edge_point(edge, plane);
            if points.last().is_none_or(|last| (p - last).norm() > eps) {
                points.push(p);
            }
        }
        if closed && points.len() > 1 && (points[0] - points[points.len() - 1]).norm() <= eps {
            points.pop();
        }

        log::debug!(
            "cross-section from face {seed_face}: {} points, closed: {closed}",
            points.len()
        );
        let edges = chain_edges(points.len(), closed);
        Polyline::new(points, closed).ok().map(|polyline| (polyline, edges))
    }
}
